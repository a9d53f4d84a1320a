use super::engine::{EngineEvent, RecognitionEngine, RecognitionFeatures, RecognitionSettings};
use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Capacity of the native event channel for one run
const EVENT_BUFFER: usize = 256;

struct FeedRun {
    tx: mpsc::Sender<EngineEvent>,
    settings: RecognitionSettings,
}

/// Recognition engine driven by events pushed from outside the process
///
/// The browser owns the actual speech recognizer and forwards its result,
/// error and end events through an [`EngineFeed`]. The engine applies the
/// run settings (interim filtering, single-utterance mode) before handing
/// events to the adapter.
pub struct FeedEngine {
    features: Option<RecognitionFeatures>,
    run: Arc<Mutex<Option<FeedRun>>>,
}

/// Handle used to push native events into the live run of a [`FeedEngine`]
#[derive(Clone)]
pub struct EngineFeed {
    run: Arc<Mutex<Option<FeedRun>>>,
}

impl FeedEngine {
    pub fn new() -> Self {
        Self {
            features: Some(RecognitionFeatures {
                continuous: true,
                interim_results: true,
            }),
            run: Arc::new(Mutex::new(None)),
        }
    }

    /// Engine that reports recognition as unavailable
    pub fn unsupported() -> Self {
        Self {
            features: None,
            run: Arc::new(Mutex::new(None)),
        }
    }

    pub fn feed(&self) -> EngineFeed {
        EngineFeed {
            run: Arc::clone(&self.run),
        }
    }
}

impl Default for FeedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecognitionEngine for FeedEngine {
    fn capabilities(&self) -> Option<RecognitionFeatures> {
        self.features
    }

    async fn start(&mut self, settings: &RecognitionSettings) -> Result<mpsc::Receiver<EngineEvent>> {
        if self.features.is_none() {
            bail!("Speech recognition is not supported");
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let previous = self.run.lock().replace(FeedRun {
            tx,
            settings: settings.clone(),
        });
        if previous.is_some() {
            debug!("Replaced a feed run that was never ended");
        }

        info!(
            "Feed engine started (lang={}, continuous={}, interim={})",
            settings.lang, settings.continuous, settings.interim_results
        );

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let run = self.run.lock().take();
        if let Some(run) = run {
            // Ignore a closed receiver: the adapter already stopped listening
            let _ = run.tx.send(EngineEvent::End).await;
        }
        Ok(())
    }

    fn abort(&mut self) {
        if let Some(run) = self.run.lock().take() {
            let _ = run.tx.try_send(EngineEvent::Error {
                error: "aborted".to_string(),
            });
            let _ = run.tx.try_send(EngineEvent::End);
        }
    }

    fn name(&self) -> &str {
        "feed"
    }
}

impl EngineFeed {
    /// Whether a run is currently accepting events
    pub fn is_live(&self) -> bool {
        self.run.lock().is_some()
    }

    /// Push a native event into the live run
    pub async fn push(&self, event: EngineEvent) -> Result<()> {
        let (tx, settings) = {
            let guard = self.run.lock();
            match guard.as_ref() {
                Some(run) => (run.tx.clone(), run.settings.clone()),
                None => bail!("No recognition run is live"),
            }
        };

        match event {
            EngineEvent::Result { results } => {
                let results: Vec<_> = if settings.interim_results {
                    results
                } else {
                    results.into_iter().filter(|r| r.is_final).collect()
                };
                if results.is_empty() {
                    return Ok(());
                }

                let has_final = results.iter().any(|r| r.is_final);
                tx.send(EngineEvent::Result { results })
                    .await
                    .context("Recognition run closed")?;

                // Single-utterance mode ends after the first final segment
                if has_final && !settings.continuous {
                    self.finish(&tx).await;
                }
            }
            EngineEvent::End => self.finish(&tx).await,
            error @ EngineEvent::Error { .. } => {
                tx.send(error).await.context("Recognition run closed")?;
            }
        }

        Ok(())
    }

    async fn finish(&self, tx: &mpsc::Sender<EngineEvent>) {
        let ended = {
            let mut guard = self.run.lock();
            match guard.as_ref() {
                Some(run) if run.tx.same_channel(tx) => guard.take(),
                _ => None,
            }
        };
        if ended.is_some() {
            let _ = tx.send(EngineEvent::End).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::engine::SegmentHypothesis;

    fn segment(text: &str, is_final: bool) -> SegmentHypothesis {
        SegmentHypothesis {
            transcript: text.to_string(),
            confidence: 0.8,
            is_final,
        }
    }

    #[tokio::test]
    async fn test_push_without_run_fails() {
        let engine = FeedEngine::new();
        let feed = engine.feed();

        assert!(!feed.is_live());
        assert!(feed.push(EngineEvent::End).await.is_err());
    }

    #[tokio::test]
    async fn test_interim_filtered_when_disabled() -> Result<()> {
        let mut engine = FeedEngine::new();
        let feed = engine.feed();
        let settings = RecognitionSettings {
            interim_results: false,
            ..Default::default()
        };
        let mut rx = engine.start(&settings).await?;

        feed.push(EngineEvent::Result {
            results: vec![segment("hel", false)],
        })
        .await?;
        feed.push(EngineEvent::Result {
            results: vec![segment("hello", true)],
        })
        .await?;

        assert_eq!(
            rx.recv().await,
            Some(EngineEvent::Result {
                results: vec![segment("hello", true)]
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_single_utterance_ends_after_final() -> Result<()> {
        let mut engine = FeedEngine::new();
        let feed = engine.feed();
        let settings = RecognitionSettings {
            continuous: false,
            ..Default::default()
        };
        let mut rx = engine.start(&settings).await?;

        feed.push(EngineEvent::Result {
            results: vec![segment("to the couple", true)],
        })
        .await?;

        assert!(matches!(rx.recv().await, Some(EngineEvent::Result { .. })));
        assert_eq!(rx.recv().await, Some(EngineEvent::End));
        assert!(!feed.is_live());
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_queues_end_after_pending() -> Result<()> {
        let mut engine = FeedEngine::new();
        let feed = engine.feed();
        let mut rx = engine.start(&RecognitionSettings::default()).await?;

        feed.push(EngineEvent::Result {
            results: vec![segment("cheers", true)],
        })
        .await?;
        engine.stop().await?;

        assert!(matches!(rx.recv().await, Some(EngineEvent::Result { .. })));
        assert_eq!(rx.recv().await, Some(EngineEvent::End));
        assert_eq!(rx.recv().await, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_abort_reports_aborted() -> Result<()> {
        let mut engine = FeedEngine::new();
        let mut rx = engine.start(&RecognitionSettings::default()).await?;

        engine.abort();

        assert_eq!(
            rx.recv().await,
            Some(EngineEvent::Error {
                error: "aborted".to_string()
            })
        );
        assert_eq!(rx.recv().await, Some(EngineEvent::End));
        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_engine_refuses_start() {
        let mut engine = FeedEngine::unsupported();
        assert!(engine.capabilities().is_none());
        assert!(engine.start(&RecognitionSettings::default()).await.is_err());
    }
}
