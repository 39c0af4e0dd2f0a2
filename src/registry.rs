//! 摄像头注册表
//!
//! 每路摄像头拥有独立的引擎 (跟踪器 + ROI 状态), 注册表只负责创建、
//! 查找和销毁, 不在摄像头之间共享任何可变状态.

use std::collections::BTreeMap;

use image::DynamicImage;
use tracing::info;

use crate::camera::CameraType;
use crate::config::HeuristicConfig;
use crate::detection::Detection;
use crate::error::RegistryError;
use crate::heuristics::{HeuristicEngine, Verdict};

/// 摄像头 ID → 引擎
#[derive(Debug, Default)]
pub struct CameraRegistry {
    base_config: HeuristicConfig,
    engines: BTreeMap<String, HeuristicEngine>,
}

impl CameraRegistry {
    /// 新注册的摄像头默认使用 `base_config`
    pub fn new(base_config: HeuristicConfig) -> Result<Self, RegistryError> {
        base_config.validate()?;
        Ok(Self {
            base_config,
            engines: BTreeMap::new(),
        })
    }

    pub fn base_config(&self) -> &HeuristicConfig {
        &self.base_config
    }

    /// 使用基础配置注册摄像头
    pub fn register(
        &mut self,
        camera_id: impl Into<String>,
        camera_type: CameraType,
    ) -> Result<&mut HeuristicEngine, RegistryError> {
        let config = self.base_config.clone();
        self.register_with_config(camera_id, camera_type, config)
    }

    /// 使用单独的配置注册摄像头
    pub fn register_with_config(
        &mut self,
        camera_id: impl Into<String>,
        camera_type: CameraType,
        config: HeuristicConfig,
    ) -> Result<&mut HeuristicEngine, RegistryError> {
        let camera_id = camera_id.into();
        if self.engines.contains_key(&camera_id) {
            return Err(RegistryError::DuplicateCamera(camera_id));
        }

        let engine = HeuristicEngine::new(camera_type, config)?;
        info!(camera = %camera_id, camera_type = %engine.camera_type(), "📹 摄像头已注册");
        Ok(self.engines.entry(camera_id).or_insert(engine))
    }

    /// 注销摄像头, 返回其引擎 (连同全部状态)
    pub fn remove(&mut self, camera_id: &str) -> Option<HeuristicEngine> {
        let engine = self.engines.remove(camera_id);
        if engine.is_some() {
            info!(camera = %camera_id, "🗑️ 摄像头已注销");
        }
        engine
    }

    pub fn get(&self, camera_id: &str) -> Option<&HeuristicEngine> {
        self.engines.get(camera_id)
    }

    pub fn get_mut(&mut self, camera_id: &str) -> Option<&mut HeuristicEngine> {
        self.engines.get_mut(camera_id)
    }

    pub fn contains(&self, camera_id: &str) -> bool {
        self.engines.contains_key(camera_id)
    }

    /// 已注册的摄像头 ID (字典序)
    pub fn camera_ids(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// 把一帧交给对应摄像头的引擎
    pub fn process_frame(
        &mut self,
        camera_id: &str,
        frame: &DynamicImage,
        detections: &[Detection],
        timestamp: f64,
    ) -> Result<Option<Verdict>, RegistryError> {
        let engine = self
            .engines
            .get_mut(camera_id)
            .ok_or_else(|| RegistryError::UnknownCamera(camera_id.to_string()))?;
        Ok(engine.process_frame(frame, detections, timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_remove() {
        let mut registry = CameraRegistry::new(HeuristicConfig::default()).unwrap();
        registry.register("lobby-2", CameraType::parse("lobby")).unwrap();
        registry.register("atm-1", CameraType::Atm).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.camera_ids().collect::<Vec<_>>(), ["atm-1", "lobby-2"]);

        assert!(matches!(
            registry.register("atm-1", CameraType::Parking),
            Err(RegistryError::DuplicateCamera(id)) if id == "atm-1"
        ));
        assert_eq!(registry.get("atm-1").unwrap().camera_type(), &CameraType::Atm);

        assert!(registry.remove("atm-1").is_some());
        assert!(registry.remove("atm-1").is_none());
        assert!(!registry.contains("atm-1"));
    }

    #[test]
    fn test_invalid_camera_config() {
        let mut registry = CameraRegistry::default();
        let mut config = HeuristicConfig::default();
        config.tracker.iou_threshold = 2.0;
        let err = registry
            .register_with_config("atm-1", CameraType::Atm, config)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
        assert!(registry.is_empty());
    }
}
