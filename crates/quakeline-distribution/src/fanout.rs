//! Bounded concurrent fan-out.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

use quakeline_types::Product;

use crate::sender::{ProductSender, SendError};

/// The result of one destination's send attempt.
#[derive(Debug)]
pub struct SendReport {
    pub destination: String,
    pub result: Result<(), SendError>,
}

/// Total distribution failure: not one destination accepted the product.
///
/// Partial failure is not an error; the per-destination outcomes in the
/// returned reports carry it.
#[derive(Debug, thiserror::Error)]
#[error("product {product_id} rejected by all {failed} destinations")]
pub struct DistributionError {
    pub product_id: String,
    pub failed: usize,
    pub reports: Vec<SendReport>,
}

/// Fans one product out to every configured destination.
///
/// Concurrency is bounded by a fixed number of permits chosen at
/// construction. A send that cannot get a permit immediately runs on the
/// calling task instead of queueing, so a burst slows the caller down
/// rather than growing an unbounded backlog.
pub struct Distributor {
    senders: Vec<Arc<dyn ProductSender>>,
    permits: Arc<Semaphore>,
}

impl Distributor {
    pub fn new(senders: Vec<Arc<dyn ProductSender>>, max_concurrent_sends: usize) -> Self {
        Self {
            senders,
            permits: Arc::new(Semaphore::new(max_concurrent_sends.max(1))),
        }
    }

    /// Sends the product to every destination and reports per-destination
    /// outcomes in destination order.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError`] only when there was at least one
    /// destination and every one of them failed.
    pub async fn send_to_all(&self, product: &Product) -> Result<Vec<SendReport>, DistributionError> {
        let mut handles = Vec::with_capacity(self.senders.len());
        for sender in &self.senders {
            let sender = Arc::clone(sender);
            let product = product.clone();
            match Arc::clone(&self.permits).try_acquire_owned() {
                Ok(permit) => {
                    handles.push(Dispatch::Spawned(tokio::task::spawn_blocking(move || {
                        let report = attempt(&*sender, &product);
                        drop(permit);
                        report
                    })));
                }
                // No free worker: run here and let the caller feel it.
                Err(_) => handles.push(Dispatch::Inline(attempt(&*sender, &product))),
            }
        }

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let report = match handle {
                Dispatch::Inline(report) => report,
                Dispatch::Spawned(task) => match task.await {
                    Ok(report) => report,
                    Err(join_err) => SendReport {
                        destination: String::from("unknown"),
                        result: Err(SendError::new(format!("send task failed: {join_err}"))),
                    },
                },
            };
            if let Err(err) = &report.result {
                warn!(
                    destination = %report.destination,
                    product = %product.id,
                    error = %err,
                    "send failed"
                );
            }
            reports.push(report);
        }

        let failed = reports.iter().filter(|r| r.result.is_err()).count();
        if !reports.is_empty() && failed == reports.len() {
            return Err(DistributionError {
                product_id: product.id.to_string(),
                failed,
                reports,
            });
        }
        Ok(reports)
    }
}

enum Dispatch {
    Inline(SendReport),
    Spawned(tokio::task::JoinHandle<SendReport>),
}

fn attempt(sender: &dyn ProductSender, product: &Product) -> SendReport {
    SendReport {
        destination: sender.name().to_string(),
        result: sender.send(product),
    }
}
