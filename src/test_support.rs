//! In-memory stand-ins for the database, the asset store and the two AI
//! providers.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    ai::{
        openai::{ChatChoice, ChatResponse, ChoiceMessage, FunctionCall},
        prompt::ChatRequest,
        ChatCompletions, GenerationSettings, ImageHit, ImageSearch, RecipeGenerator,
        UpstreamError,
    },
    auth::JwtKeys,
    config::{DefaultImage, JwtConfig},
    recipes::{
        repo::RecipeStore,
        repo_types::{NewRecipe, Recipe},
        services::RecipeService,
    },
    state::AppState,
    storage::{ImageStore, ImageUpload, StoredImage},
};

pub const JWT_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct MemoryRecipeStore {
    rows: Mutex<Vec<Recipe>>,
    fail_writes: AtomicBool,
}

impl MemoryRecipeStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, id: Uuid) -> Option<Recipe> {
        self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned()
    }

    fn check_writes(&self) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("database unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn insert(&self, recipe: NewRecipe) -> anyhow::Result<Recipe> {
        self.check_writes()?;
        let now = OffsetDateTime::now_utc();
        let row = Recipe {
            id: Uuid::new_v4(),
            recipe_title: recipe.fields.recipe_title,
            recipe_description: recipe.fields.recipe_description,
            recipe_ingredients: recipe.fields.recipe_ingredients,
            recipe_instructions: recipe.fields.recipe_instructions,
            recipe_tags: recipe.fields.recipe_tags,
            recipe_special_diets: recipe.fields.recipe_special_diets,
            recipe_image: recipe.image.url,
            recipe_image_public: recipe.image.public_id,
            recipe_created_by: recipe.owner,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_by_owner(&self, owner: &str) -> anyhow::Result<Vec<Recipe>> {
        let mut rows: Vec<Recipe> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.recipe_created_by == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn find_owned(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.recipe_created_by == owner)
            .cloned())
    }

    async fn save(&self, recipe: &Recipe) -> anyhow::Result<Option<Recipe>> {
        self.check_writes()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == recipe.id && r.recipe_created_by == recipe.recipe_created_by)
        else {
            return Ok(None);
        };
        *row = Recipe {
            created_at: row.created_at,
            recipe_created_by: row.recipe_created_by.clone(),
            updated_at: OffsetDateTime::now_utc(),
            ..recipe.clone()
        };
        Ok(Some(row.clone()))
    }

    async fn delete_owned(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        self.check_writes()?;
        let mut rows = self.rows.lock().unwrap();
        let pos = rows
            .iter()
            .position(|r| r.id == id && r.recipe_created_by == owner);
        Ok(pos.map(|i| rows.remove(i)))
    }
}

/// Hands out `recipes/{n}.png` references in upload order.
#[derive(Default)]
pub struct FakeImageStore {
    uploads: AtomicUsize,
    destroyed: Mutex<Vec<String>>,
    fail_destroy: AtomicBool,
}

impl FakeImageStore {
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }

    pub fn fail_destroy(&self, fail: bool) {
        self.fail_destroy.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn upload(&self, _image: ImageUpload) -> anyhow::Result<StoredImage> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let public_id = format!("recipes/{n}.png");
        Ok(StoredImage {
            url: format!("https://cdn.test/{public_id}"),
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> anyhow::Result<()> {
        if self.fail_destroy.load(Ordering::SeqCst) {
            anyhow::bail!("storage unavailable");
        }
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

enum Reply {
    Arguments(String),
    Text(String),
    Status(u16),
}

pub struct FakeChat {
    reply: Reply,
    calls: AtomicUsize,
}

impl FakeChat {
    pub fn arguments(arguments: String) -> Self {
        Self::new(Reply::Arguments(arguments))
    }

    pub fn text(content: &str) -> Self {
        Self::new(Reply::Text(content.to_string()))
    }

    pub fn status(status: u16) -> Self {
        Self::new(Reply::Status(status))
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompletions for FakeChat {
    async fn create(&self, _request: &ChatRequest) -> Result<ChatResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let message = match &self.reply {
            Reply::Arguments(arguments) => ChoiceMessage {
                content: None,
                function_call: Some(FunctionCall {
                    name: Some("create_recipe".into()),
                    arguments: arguments.clone(),
                }),
            },
            Reply::Text(content) => ChoiceMessage {
                content: Some(content.clone()),
                function_call: None,
            },
            Reply::Status(status) => {
                return Err(UpstreamError::Status {
                    provider: "openai",
                    status: *status,
                })
            }
        };
        Ok(ChatResponse {
            choices: vec![ChatChoice { message }],
        })
    }
}

pub struct FakeImages {
    hits: Vec<ImageHit>,
    fail: bool,
    calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl FakeImages {
    pub fn with_hits(urls: &[&str]) -> Self {
        Self {
            hits: urls
                .iter()
                .map(|u| ImageHit {
                    content_url: u.to_string(),
                })
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_hits(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSearch for FakeImages {
    async fn search(&self, query: &str) -> Result<Vec<ImageHit>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());
        if self.fail {
            return Err(UpstreamError::Status {
                provider: "bing",
                status: 500,
            });
        }
        Ok(self.hits.clone())
    }
}

pub fn jwt_keys() -> JwtKeys {
    JwtKeys::from_config(&JwtConfig {
        secret: JWT_SECRET.into(),
        issuer: None,
        audience: None,
    })
}

/// Application state wired to the fakes above, plus handles to inspect them.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryRecipeStore>,
    pub images: Arc<FakeImageStore>,
    pub chat: Arc<FakeChat>,
    pub search: Arc<FakeImages>,
}

impl TestApp {
    pub fn new(chat: FakeChat, search: FakeImages) -> Self {
        let store = Arc::new(MemoryRecipeStore::default());
        let images = Arc::new(FakeImageStore::default());
        let chat = Arc::new(chat);
        let search = Arc::new(search);

        let recipes = RecipeService::new(store.clone(), images.clone(), DefaultImage::default());
        let generator =
            RecipeGenerator::new(chat.clone(), search.clone(), GenerationSettings::default());
        let state = AppState::from_parts(jwt_keys(), recipes, generator);

        Self {
            state,
            store,
            images,
            chat,
            search,
        }
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
