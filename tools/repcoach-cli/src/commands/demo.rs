//! Run a session over a synthetic workout.

use repcoach_common::config::AppConfig;
use repcoach_pose_source::SyntheticSource;

use crate::{MotionArgs, SessionArgs};

pub async fn run(config: &AppConfig, args: SessionArgs, motion: MotionArgs) -> anyhow::Result<()> {
    let kind = super::exercise_kind(config, &args)?;
    let profile = super::load_profile(config, &args)?;
    let source = SyntheticSource::new(super::synthetic_config(kind, &motion));
    super::execute(config, &args, profile, Box::new(source)).await
}
