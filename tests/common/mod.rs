#![allow(dead_code)]

use color_eyre::Result;
use lscan::backend::{LabeledSeries, ScanAll};
use lscan::{App, AppConfig, AppEvent, AppOptions, Backend, BackendRequest, BackendResponse, Theme};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;

/// Backend answering from a closure, so each test scripts its own replies.
pub struct ScriptedBackend<F>(pub F);

impl<F> Backend for ScriptedBackend<F>
where
    F: Fn(&BackendRequest) -> Result<BackendResponse> + Send + Sync,
{
    fn fetch(&self, request: &BackendRequest) -> Result<BackendResponse> {
        (self.0)(request)
    }
}

/// A `/scan_all` body with one series per residue coprime to `q`, every
/// value offset by `offset` so tests can tell replies apart.
pub fn scan_all(q: u64, offset: f64) -> ScanAll {
    let t: Vec<f64> = (0..=10).map(|i| i as f64 * 10.0).collect();
    let datasets = lscan::residues::enumerate(q)
        .into_iter()
        .map(|r| LabeledSeries {
            label: r.label(),
            data: t.iter().map(|x| Some(offset + x / 100.0)).collect(),
        })
        .collect();
    ScanAll { t, datasets }
}

pub fn app_with<B: Backend + 'static>(backend: B, options: AppOptions) -> (App, Receiver<AppEvent>) {
    let (tx, rx) = channel();
    let theme = Theme::from_config(&AppConfig::default().theme).unwrap();
    (App::new(tx, Arc::new(backend), theme, options), rx)
}

/// Deliver `n` events from the channel, and any follow-up events they
/// produce, to the app.
pub fn pump(app: &mut App, rx: &Receiver<AppEvent>, n: usize) {
    for _ in 0..n {
        let event = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker did not report back");
        let mut next = app.event(event);
        while let Some(event) = next.take() {
            next = app.event(event);
        }
    }
}
