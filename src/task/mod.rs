pub mod coverage;
pub mod house;
pub mod asn;

use crate::model::census::Census;
use crate::ReportCache;
use std::sync::RwLock;

pub trait Task: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self, census: &Census) -> anyhow::Result<()>;
}

fn update_cache(cache: &RwLock<ReportCache>, update: impl FnOnce(&mut ReportCache)) -> anyhow::Result<()> {
    let mut data_lock = cache
        .write()
        .map_err(|_| anyhow::anyhow!("Report cache lock is poisoned"))?;

    update(&mut data_lock);
    data_lock.last_updated = std::time::SystemTime::now();

    Ok(())
}
