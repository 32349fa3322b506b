use crate::builder;
use crate::config::{Part, ScriptLayout};
use crate::error::Result;
use crate::scripts;
use crate::source;
use crate::store::{archives, paths};
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, info};

/// Entry points the orchestrator calls for a part. Both return the paths the
/// part owns, which the orchestrator records for change tracking and removal.
pub trait Recipe {
    fn install(&self) -> impl Future<Output = Result<Vec<PathBuf>>>;

    fn update(&self) -> impl Future<Output = Result<Vec<PathBuf>>>;
}

/// Fetches, builds and wires up a RabbitMQ distribution.
#[derive(Clone, Debug)]
pub struct RabbitMq {
    part: Part,
}

impl RabbitMq {
    pub fn new(part: Part) -> Self {
        Self { part }
    }

    pub fn part(&self) -> &Part {
        &self.part
    }

    async fn install_distribution(&self) -> Result<()> {
        let options = &self.part.options;
        let part_dir = self.part.destination();

        let archive_path = source::fetch(
            &options.url,
            &self.part.directories.downloads,
            options.sha256.as_deref(),
        )
        .await?;

        let file_name = paths::get_archive_file_name(&options.url)?;

        let extracted = archives::extract(&self.part.name, &archive_path, &file_name).await?;

        builder::install(options, &extracted.root, &part_dir).await?;

        let temp_path = extracted.temp_dir.path().to_path_buf();
        extracted.temp_dir.close()?;

        debug!("removed {:?}", temp_path);

        Ok(())
    }
}

impl Recipe for RabbitMq {
    async fn install(&self) -> Result<Vec<PathBuf>> {
        let part_dir = self.part.destination();

        if part_dir.exists() {
            info!("rabbitmq already installed: {:?}", part_dir);
        } else {
            self.install_distribution().await?;
        }

        let mut installed = vec![part_dir];

        installed.extend(scripts::generate(&self.part).await?);

        Ok(installed)
    }

    async fn update(&self) -> Result<Vec<PathBuf>> {
        let part_dir = self.part.destination();

        match scripts::resolve_layout(self.part.options.scripts, &part_dir) {
            ScriptLayout::Env => Ok(vec![]),
            _ => Ok(vec![part_dir]),
        }
    }
}
