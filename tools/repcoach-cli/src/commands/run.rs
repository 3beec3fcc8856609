//! Run a session over a recorded pose stream.

use std::path::PathBuf;

use repcoach_common::config::AppConfig;
use repcoach_pose_source::ReplaySource;

use crate::SessionArgs;

pub async fn run(config: &AppConfig, stream: PathBuf, args: SessionArgs) -> anyhow::Result<()> {
    if !stream.is_file() {
        anyhow::bail!("Pose stream not found: {}", stream.display());
    }
    let profile = super::load_profile(config, &args)?;
    super::execute(config, &args, profile, Box::new(ReplaySource::new(stream))).await
}
