//! Bridges the async region load into egui's synchronous update loop.
//!
//! The load runs in the background and delivers exactly one [`LoadOutcome`].
//! The UI polls for it each frame with [`LoadChannel::try_recv`].

use super::{load_regions, LoadOutcome};
use crate::config::GlobeConfig;
use eframe::egui;
use futures_channel::oneshot;

/// Channel for the one-shot background region load.
#[derive(Default)]
pub struct LoadChannel {
    receiver: Option<oneshot::Receiver<LoadOutcome>>,
}

impl LoadChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn region_paths(config: &GlobeConfig) -> Vec<String> {
        config
            .regions
            .iter()
            .map(|id| config.region_path(id))
            .collect()
    }

    /// Starts loading every configured region with browser fetches.
    #[cfg(target_arch = "wasm32")]
    pub fn start(&mut self, ctx: egui::Context, config: &GlobeConfig) {
        let (sender, receiver) = oneshot::channel();
        self.receiver = Some(receiver);
        let paths = Self::region_paths(config);

        log::info!("Loading {} region documents", paths.len());

        wasm_bindgen_futures::spawn_local(async move {
            let source = super::HttpSource::new();
            let outcome = load_regions(&source, paths).await;
            let _ = sender.send(outcome);
            ctx.request_repaint();
        });
    }

    /// Starts loading every configured region from the asset root.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn start(&mut self, ctx: egui::Context, config: &GlobeConfig) {
        let (sender, receiver) = oneshot::channel();
        self.receiver = Some(receiver);
        let paths = Self::region_paths(config);
        let source = super::FileSource::new(&config.asset_root);

        log::info!(
            "Loading {} region documents from {}",
            paths.len(),
            config.asset_root
        );

        std::thread::spawn(move || {
            let outcome = pollster::block_on(load_regions(&source, paths));
            let _ = sender.send(outcome);
            ctx.request_repaint();
        });
    }

    /// Non-blocking check for the finished load.
    ///
    /// Returns `Some` once, when every region has settled. If the background
    /// task vanished without answering, an empty outcome is returned so the
    /// caller can carry on with a bare globe.
    pub fn try_recv(&mut self) -> Option<LoadOutcome> {
        let receiver = self.receiver.as_mut()?;
        match receiver.try_recv() {
            Ok(Some(outcome)) => {
                self.receiver = None;
                Some(outcome)
            }
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                log::error!("Region loader exited without a result");
                self.receiver = None;
                Some(LoadOutcome::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_channel() {
        let mut channel = LoadChannel::new();
        assert!(channel.receiver.is_none());
        assert!(channel.try_recv().is_none());
    }

    #[test]
    fn test_receives_once() {
        let (sender, receiver) = oneshot::channel();
        let mut channel = LoadChannel {
            receiver: Some(receiver),
        };

        assert!(channel.try_recv().is_none());
        assert!(channel.receiver.is_some());

        sender
            .send(LoadOutcome {
                documents: vec![None, None],
                ..Default::default()
            })
            .unwrap();

        let outcome = channel.try_recv().unwrap();
        assert_eq!(outcome.failed_count(), 2);
        assert!(channel.receiver.is_none());
        assert!(channel.try_recv().is_none());
    }

    #[test]
    fn test_dropped_sender_yields_empty_outcome() {
        let (sender, receiver) = oneshot::channel::<LoadOutcome>();
        let mut channel = LoadChannel {
            receiver: Some(receiver),
        };
        drop(sender);

        let outcome = channel.try_recv().unwrap();
        assert!(outcome.documents.is_empty());
        assert!(channel.receiver.is_none());
    }

    #[test]
    fn test_region_paths() {
        let config = GlobeConfig {
            regions: vec!["NOR".to_string(), "SWE".to_string()],
            ..Default::default()
        };
        assert_eq!(
            LoadChannel::region_paths(&config),
            vec!["countries/NOR.geo.json", "countries/SWE.geo.json"]
        );
    }
}
