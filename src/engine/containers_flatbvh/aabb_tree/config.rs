use serde::{Deserialize, Serialize};

// Leaves per bottom-level container; also the size below which rebuilds skip sorting
pub const LEAF_GROUP_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AabbTreeConfig
{
    pub name: String, // only used in logs and debug output
    pub high_quality: bool, // surface-area partitioning on rebuild
    pub log_rebuilds: bool,
    pub thresholds: MaintenanceThresholds,
}
impl Default for AabbTreeConfig
{
    fn default() -> Self
    {
        Self
        {
            name: String::new(),
            high_quality: false,
            log_rebuilds: false,
            thresholds: MaintenanceThresholds::default(),
        }
    }
}
impl AabbTreeConfig
{
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self
    {
        Self { name: name.into(), ..Default::default() }
    }

    #[inline] #[must_use]
    pub fn high_quality(self, high_quality: bool) -> Self { Self { high_quality, ..self } }
}

/// When edits escalate from a cheap refit ("rebound") to a full rebuild.
/// Ratios are against the number of live leaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceThresholds
{
    pub rebuild_add_ratio: f32,
    pub rebuild_add_count: usize,
    pub rebound_update_ratio: f32,
    pub rebuild_update_ratio: f32,
    pub tombstone_min_skipped: usize,
    pub tombstone_skip_ratio: usize,
}
impl Default for MaintenanceThresholds
{
    fn default() -> Self
    {
        Self
        {
            rebuild_add_ratio: 0.2,
            rebuild_add_count: 100,
            rebound_update_ratio: 0.5,
            rebuild_update_ratio: 3.0,
            tombstone_min_skipped: 30,
            tombstone_skip_ratio: 5,
        }
    }
}
impl MaintenanceThresholds
{
    #[inline] #[must_use]
    pub fn rebuild_after_adds(&self, num_adds: usize, num_leaves: usize) -> bool
    {
        num_adds > self.rebuild_add_count ||
        (num_adds as f32) > (num_leaves as f32) * self.rebuild_add_ratio
    }

    #[inline] #[must_use]
    pub fn rebound_after_updates(&self, num_updates: usize, num_leaves: usize) -> bool
    {
        (num_updates as f32) > (num_leaves as f32) * self.rebound_update_ratio
    }

    #[inline] #[must_use]
    pub fn rebuild_after_updates(&self, num_updates: usize, num_leaves: usize) -> bool
    {
        (num_updates as f32) > (num_leaves as f32) * self.rebuild_update_ratio
    }

    // a query wading through far more removed leaves than it returns
    #[inline] #[must_use]
    pub fn too_many_tombstones(&self, num_skipped: usize, num_returned: usize) -> bool
    {
        num_skipped > self.tombstone_min_skipped &&
        num_skipped > num_returned.saturating_mul(self.tombstone_skip_ratio)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn default_thresholds()
    {
        let t = MaintenanceThresholds::default();

        assert!(!t.rebuild_after_adds(20, 100));
        assert!(t.rebuild_after_adds(21, 100));
        assert!(!t.rebuild_after_adds(100, 10_000));
        assert!(t.rebuild_after_adds(101, 10_000));

        assert!(!t.rebound_after_updates(5, 10));
        assert!(t.rebound_after_updates(6, 10));

        assert!(!t.rebuild_after_updates(30, 10));
        assert!(t.rebuild_after_updates(31, 10));

        assert!(!t.too_many_tombstones(30, 0));
        assert!(t.too_many_tombstones(31, 0));
        assert!(!t.too_many_tombstones(50, 10));
        assert!(t.too_many_tombstones(51, 10));
    }

    #[test]
    fn partial_toml()
    {
        let config: AabbTreeConfig = toml::from_str(r#"
            name = "statics"
            high_quality = true
            [thresholds]
            rebuild_add_count = 8
        "#).expect("valid config");

        assert_eq!(config.name, "statics");
        assert!(config.high_quality);
        assert!(!config.log_rebuilds);
        assert_eq!(config.thresholds.rebuild_add_count, 8);
        assert_eq!(config.thresholds.rebuild_add_ratio, 0.2);
    }
}
