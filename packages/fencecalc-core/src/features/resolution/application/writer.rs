//! Persists a resolution as one atomic batch

use tracing::info;

use fencecalc_storage::{RegionConfigWriter, RegionId};

use crate::features::resolution::domain::Resolution;
use crate::shared::{FenceError, Result};

pub struct ConfigWriter<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ConfigWriter<'a, S>
where
    S: RegionConfigWriter + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Write every resolved value and part selection of `region`.
    ///
    /// Either the whole resolution is committed or nothing is.
    pub fn persist(&self, region: RegionId, resolution: &Resolution) -> Result<()> {
        if resolution.region != region {
            return Err(FenceError::input(format!(
                "resolution of region {} cannot be written to region {}",
                resolution.region, region
            )));
        }

        let update = resolution.to_update();
        self.store.apply_update(region, &update)?;
        info!(
            "Persisted region {}: {} params, {} parts",
            region,
            update.params.len(),
            update.parts.len()
        );
        Ok(())
    }
}
