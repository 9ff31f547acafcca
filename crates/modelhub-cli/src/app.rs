//! Command handlers: the view layer on top of `AuthClient` and `ApiClient`.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use modelhub_core::api::{ApiClient, HttpClient};
use modelhub_core::auth::AuthClient;
use modelhub_core::models::{DatasetCreate, ModelCreate, TrainingCreate};
use modelhub_core::routes::{self, RouteMatch, View};
use modelhub_core::Config;

use crate::cli::{
    AdminCommand, AdminResourceCommand, Command, ResourceCommand, TrainingCommand,
};
use crate::render;

/// Environment variable read instead of prompting for a password
const PASSWORD_ENV: &str = "MODELHUB_PASSWORD";

pub struct App {
    config: Config,
    auth: AuthClient,
    api: ApiClient,
    json: bool,
}

impl App {
    pub fn new(config: Config, json: bool) -> Result<Self> {
        let store = config.token_store()?;
        let http = HttpClient::new(config.client_config()?, store)
            .context("Failed to build HTTP client")?;
        let auth = AuthClient::with_endpoints(http.clone(), config.endpoints.clone());
        let api = ApiClient::new(http);
        Ok(Self {
            config,
            auth,
            api,
            json,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email } => self.login(email).await,
            Command::Signup { email } => self.signup(&email).await,
            Command::Logout => {
                self.auth.logout().await;
                println!("Logged out.");
                Ok(())
            }
            Command::Whoami => {
                let user = self.auth.current_user().await?;
                self.emit(&user, render::user)
            }
            Command::Datasets(cmd) => self.datasets(cmd).await,
            Command::Models(cmd) => self.models(cmd).await,
            Command::Trainings(cmd) => self.trainings(cmd).await,
            Command::Admin(cmd) => self.admin(cmd).await,
            Command::Open { path } => self.open(&path).await,
            Command::Dashboard => self.dashboard().await,
        }
    }

    /// Print either JSON or the text rendering of a value.
    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl Fn(&T) -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text(value));
        }
        Ok(())
    }

    fn read_password(prompt: &str) -> Result<String> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return Ok(password);
        }
        rpassword::prompt_password(prompt).context("Failed to read password")
    }

    async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = email
            .or_else(|| self.config.last_email.clone())
            .context("No email given and none remembered; pass one to `login`")?;
        let password = Self::read_password("Password: ")?;

        self.auth.login(&email, &password).await?;
        info!(email = %email, "Login succeeded");

        if self.config.last_email.as_deref() != Some(email.as_str()) {
            self.config.last_email = Some(email.clone());
            if let Err(e) = self.config.save() {
                debug!(error = %e, "Could not remember email");
            }
        }
        println!("Logged in as {}.", email);
        Ok(())
    }

    async fn signup(&self, email: &str) -> Result<()> {
        let password = Self::read_password("Choose a password: ")?;
        let response = self.auth.signup(email, &password).await?;
        debug!(status = %response.status, "Signup response");
        println!("Account created for {}. Run `modelhub login` to sign in.", email);
        Ok(())
    }

    async fn datasets(&self, cmd: ResourceCommand) -> Result<()> {
        match cmd {
            ResourceCommand::List => self.emit(&self.api.list_datasets().await?, |d| render::datasets(d)),
            ResourceCommand::Show { id } => self.emit(&self.api.get_dataset(id).await?, render::dataset),
            ResourceCommand::Create { name } => {
                let created = self.api.create_dataset(&DatasetCreate::new(name)).await?;
                self.emit(&created, render::dataset)
            }
        }
    }

    async fn models(&self, cmd: ResourceCommand) -> Result<()> {
        match cmd {
            ResourceCommand::List => self.emit(&self.api.list_models().await?, |m| render::models(m)),
            ResourceCommand::Show { id } => self.emit(&self.api.get_model(id).await?, render::model),
            ResourceCommand::Create { name } => {
                let created = self.api.create_model(&ModelCreate::new(name)).await?;
                self.emit(&created, render::model)
            }
        }
    }

    async fn trainings(&self, cmd: TrainingCommand) -> Result<()> {
        match cmd {
            TrainingCommand::List => self.emit(&self.api.list_trainings().await?, |t| render::trainings(t)),
            TrainingCommand::Show { id } => self.emit(&self.api.get_training(id).await?, render::training),
            TrainingCommand::Create {
                name,
                model,
                dataset,
            } => {
                let created = self
                    .api
                    .create_training(&TrainingCreate {
                        experiment_name: name,
                        model_id: model,
                        dataset_id: dataset,
                    })
                    .await?;
                self.emit(&created, render::training)
            }
        }
    }

    async fn admin(&self, cmd: AdminCommand) -> Result<()> {
        match cmd {
            AdminCommand::Users => self.emit(&self.api.admin_list_users().await?, |u| render::users(u)),
            AdminCommand::DeleteUser { email } => {
                let ack = self.api.admin_delete_user(&email).await?;
                println!("{}", ack.message);
                Ok(())
            }
            AdminCommand::Datasets(cmd) => match cmd {
                AdminResourceCommand::List => {
                    self.emit(&self.api.admin_list_datasets().await?, |d| render::datasets(d))
                }
                AdminResourceCommand::Show { id } => {
                    self.emit(&self.api.admin_get_dataset(id).await?, render::dataset)
                }
                AdminResourceCommand::Create { name } => {
                    let created = self.api.admin_create_dataset(&DatasetCreate::new(name)).await?;
                    self.emit(&created, render::dataset)
                }
                AdminResourceCommand::Delete { id } => {
                    println!("{}", self.api.admin_delete_dataset(id).await?.message);
                    Ok(())
                }
            },
            AdminCommand::Models(cmd) => match cmd {
                AdminResourceCommand::List => {
                    self.emit(&self.api.admin_list_models().await?, |m| render::models(m))
                }
                AdminResourceCommand::Show { id } => {
                    self.emit(&self.api.admin_get_model(id).await?, render::model)
                }
                AdminResourceCommand::Create { name } => {
                    let created = self.api.admin_create_model(&ModelCreate::new(name)).await?;
                    self.emit(&created, render::model)
                }
                AdminResourceCommand::Delete { id } => {
                    println!("{}", self.api.admin_delete_model(id).await?.message);
                    Ok(())
                }
            },
        }
    }

    async fn dashboard(&self) -> Result<()> {
        let user = self.auth.current_user().await?;
        let (datasets, models, trainings) = futures::try_join!(
            self.api.list_datasets(),
            self.api.list_models(),
            self.api.list_trainings(),
        )?;

        if self.json {
            let value = serde_json::json!({
                "user": user,
                "datasets": datasets,
                "models": models,
                "trainings": trainings,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("{}\n", render::user(&user));
        println!("Datasets ({})\n{}\n", datasets.len(), render::datasets(&datasets));
        println!("Models ({})\n{}\n", models.len(), render::models(&models));
        println!("Trainings ({})\n{}", trainings.len(), render::trainings(&trainings));
        Ok(())
    }

    /// Resolve a front-end path and show what that view would show.
    async fn open(&self, path: &str) -> Result<()> {
        let Some(route) = routes::resolve(path) else {
            bail!("No view for path {:?}", path);
        };
        debug!(view = %route.view, params = ?route.params, "Resolved route");

        if route.view.requires_auth() && !self.auth.is_authenticated().await {
            bail!("The {} view requires login; run `modelhub login` first", route.view);
        }

        match route.view {
            View::Home | View::About => {
                println!("Model management: datasets, models and training runs.");
                Ok(())
            }
            View::Login => {
                println!("Run `modelhub login <email>` to sign in.");
                Ok(())
            }
            View::Signup => {
                println!("Run `modelhub signup <email>` to create an account.");
                Ok(())
            }
            View::Dashboard => self.dashboard().await,
            View::Datasets => self.datasets(ResourceCommand::List).await,
            View::DatasetDetails => {
                let id = id_param(&route, "dataset_id")?;
                self.datasets(ResourceCommand::Show { id }).await
            }
            View::Models => self.models(ResourceCommand::List).await,
            View::ModelDetails => {
                let id = id_param(&route, "model_id")?;
                self.models(ResourceCommand::Show { id }).await
            }
            View::Trainings => self.trainings(TrainingCommand::List).await,
            View::TrainingDetails => {
                let id = id_param(&route, "training_id")?;
                self.trainings(TrainingCommand::Show { id }).await
            }
            View::Admin | View::AdminUsers => self.admin(AdminCommand::Users).await,
            View::AdminDatasets => self.admin(AdminCommand::Datasets(AdminResourceCommand::List)).await,
            View::AdminDatasetDetails => {
                let id = id_param(&route, "dataset_id")?;
                self.admin(AdminCommand::Datasets(AdminResourceCommand::Show { id })).await
            }
            View::AdminModels => self.admin(AdminCommand::Models(AdminResourceCommand::List)).await,
            View::AdminModelDetails => {
                let id = id_param(&route, "model_id")?;
                self.admin(AdminCommand::Models(AdminResourceCommand::Show { id })).await
            }
        }
    }
}

fn id_param(route: &RouteMatch, name: &str) -> Result<i64> {
    route
        .id_param(name)
        .with_context(|| format!("{} must be a number, got {:?}", name, route.param(name).unwrap_or("")))
}
