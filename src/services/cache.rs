//! Short-lived device-info cache

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::DeviceInfo;

/// Device snapshot with the instant it was captured
#[derive(Debug, Clone)]
pub struct CachedDeviceInfo {
    pub info: DeviceInfo,
    pub captured_at: Instant,
}

impl CachedDeviceInfo {
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.captured_at)
    }
}

/// Single-slot cache; every store replaces the previous snapshot
#[derive(Debug)]
pub struct DeviceInfoCache {
    ttl: Duration,
    slot: Mutex<Option<CachedDeviceInfo>>,
}

impl DeviceInfoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self, info: DeviceInfo) {
        self.store_at(info, Instant::now());
    }

    pub fn store_at(&self, info: DeviceInfo, captured_at: Instant) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(CachedDeviceInfo { info, captured_at });
    }

    /// Fresh snapshot and its age, if any
    pub fn get(&self) -> Option<(DeviceInfo, Duration)> {
        self.get_at(Instant::now())
    }

    pub fn get_at(&self, now: Instant) -> Option<(DeviceInfo, Duration)> {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().and_then(|cached| {
            let age = cached.age_at(now);
            (age < self.ttl).then(|| (cached.info.clone(), age))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BatteryLevel;

    fn sample_info(battery: i64) -> DeviceInfo {
        DeviceInfo {
            connected: true,
            battery_level: Some(BatteryLevel::Integer(battery)),
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_within_ttl() {
        let cache = DeviceInfoCache::new(Duration::from_secs(30));
        let t0 = Instant::now();
        cache.store_at(sample_info(80), t0);

        let (info, age) = cache
            .get_at(t0 + Duration::from_secs(29))
            .expect("still fresh");
        assert_eq!(info.battery_level, Some(BatteryLevel::Integer(80)));
        assert_eq!(age, Duration::from_secs(29));
    }

    #[test]
    fn test_expires_at_ttl() {
        let cache = DeviceInfoCache::new(Duration::from_secs(30));
        let t0 = Instant::now();
        cache.store_at(sample_info(80), t0);

        assert!(cache.get_at(t0 + Duration::from_secs(30)).is_none());
        assert!(cache.get_at(t0 + Duration::from_secs(31)).is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let cache = DeviceInfoCache::new(Duration::from_secs(30));
        let t0 = Instant::now();
        cache.store_at(sample_info(80), t0);
        cache.store_at(sample_info(40), t0 + Duration::from_secs(5));

        let (info, age) = cache
            .get_at(t0 + Duration::from_secs(6))
            .expect("fresh");
        assert_eq!(info.battery_level, Some(BatteryLevel::Integer(40)));
        assert_eq!(age, Duration::from_secs(1));
    }

    #[test]
    fn test_empty_until_stored() {
        let cache = DeviceInfoCache::new(Duration::from_secs(30));
        assert!(cache.get().is_none());
        cache.store(sample_info(10));
        assert!(cache.get().is_some());
    }
}
