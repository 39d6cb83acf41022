//! Extraction orchestrator
//!
//! Runs every field extractor against one snapshot and assembles the
//! record. Each field gets its own blocking worker that parses its own copy
//! of the document; all workers share one deadline. A field whose worker
//! times out or panics keeps its default and the rest of the record is
//! still returned.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::join_all;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::extractors::{FieldExtractors, RatingInfo};
use crate::record::{BankOffer, PriceInfo, ProductRecord};
use crate::snapshot::{MarkupSnapshot, SnapshotProvider};
use crate::summary::SummarySynthesizer;

/// Output of one field worker.
#[derive(Debug)]
enum FieldValue {
    Name(Option<String>),
    Rating(RatingInfo),
    Price(PriceInfo),
    Features(Vec<String>),
    SpecTable(BTreeMap<String, String>),
    Images(Vec<String>),
    ManufacturerImages(Vec<String>),
    Offers(Vec<BankOffer>),
}

impl FieldValue {
    fn apply(self, record: &mut ProductRecord) {
        match self {
            FieldValue::Name(name) => record.product_name = name,
            FieldValue::Rating(info) => {
                record.rating = info.rating;
                record.number_of_ratings = info.number_of_ratings;
            }
            FieldValue::Price(price) => record.set_price(price),
            FieldValue::Features(bullets) => record.about_this_item = bullets,
            FieldValue::SpecTable(table) => record.product_information = table,
            FieldValue::Images(urls) => record.product_images = urls,
            FieldValue::ManufacturerImages(urls) => record.manufacturer_images = urls,
            FieldValue::Offers(offers) => record.bank_offers = offers,
        }
    }
}

/// Process-wide runtime behind the blocking `extract`. One scheduler thread
/// is enough; field work happens on the blocking pool.
static WORKER_RUNTIME: OnceLock<Option<Runtime>> = OnceLock::new();

fn worker_runtime() -> Option<&'static Runtime> {
    WORKER_RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("product-parser-worker")
                .enable_time()
                .build()
                .map_err(|e| warn!(error = %e, "could not start worker runtime, extracting inline"))
                .ok()
        })
        .as_ref()
}

pub struct ProductExtractor {
    fields: Arc<FieldExtractors>,
    summary: SummarySynthesizer,
    timeout: Duration,
    settle_delay: Duration,
}

impl ProductExtractor {
    /// Compile every selector and pattern in `config`.
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let fields = FieldExtractors::new(&config)?;
        Ok(Self {
            fields: Arc::new(fields),
            timeout: config.timeout(),
            settle_delay: config.settle_delay(),
            summary: SummarySynthesizer::new(config.summary),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(ExtractorConfig::default())
    }

    /// Blocking extraction. Must not be called from inside an async runtime;
    /// use [`ProductExtractor::extract_async`] there.
    pub fn extract(
        &self,
        snapshot: &MarkupSnapshot,
        provider: Option<Arc<dyn SnapshotProvider>>,
    ) -> ProductRecord {
        let Some(runtime) = worker_runtime() else {
            return self.extract_inline(snapshot, provider);
        };
        // workers abandoned at the deadline keep running on the blocking pool
        runtime.block_on(self.extract_async(snapshot, provider))
    }

    /// Extract from raw markup. Absent or blank markup is the one fatal case.
    pub fn extract_markup(
        &self,
        markup: Option<&str>,
        provider: Option<Arc<dyn SnapshotProvider>>,
    ) -> Result<ProductRecord> {
        let markup = markup.ok_or_else(|| ExtractError::unavailable("no page markup"))?;
        let snapshot = MarkupSnapshot::new(markup)?;
        Ok(self.extract(&snapshot, provider))
    }

    /// Take the initial snapshot from a live page, then extract.
    pub fn extract_from(&self, provider: Arc<dyn SnapshotProvider>) -> Result<ProductRecord> {
        let snapshot = provider.snapshot().map_err(|e| match e {
            ExtractError::SnapshotUnavailable(_) => e,
            other => ExtractError::unavailable(other.to_string()),
        })?;
        Ok(self.extract(&snapshot, Some(provider)))
    }

    pub async fn extract_async(
        &self,
        snapshot: &MarkupSnapshot,
        provider: Option<Arc<dyn SnapshotProvider>>,
    ) -> ProductRecord {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let settle = self.settle_delay;

        let workers: Vec<(&'static str, JoinHandle<FieldValue>)> = vec![
            ("product_name", self.spawn(snapshot, |f, s| FieldValue::Name(f.name.extract(&s.document())))),
            ("rating", self.spawn(snapshot, |f, s| FieldValue::Rating(f.rating.extract(&s.document())))),
            ("price", self.spawn(snapshot, |f, s| FieldValue::Price(f.price.extract(&s.document())))),
            ("about_this_item", self.spawn(snapshot, |f, s| FieldValue::Features(f.features.extract(&s.document())))),
            ("product_information", self.spawn(snapshot, |f, s| FieldValue::SpecTable(f.spec_table.extract(&s.document())))),
            ("product_images", self.spawn(snapshot, |f, s| {
                FieldValue::Images(f.images.extract(&s.document(), s.base_url()))
            })),
            ("manufacturer_images", self.spawn(snapshot, |f, s| {
                FieldValue::ManufacturerImages(f.manufacturer_images.extract(&s.document(), s.base_url()))
            })),
            ("bank_offers", self.spawn(snapshot, move |f, s| {
                FieldValue::Offers(f.offers.extract(s, provider.as_deref(), settle))
            })),
        ];

        let outcomes = join_all(workers.into_iter().map(|(field, handle)| async move {
            match timeout_at(deadline, handle).await {
                Ok(Ok(value)) => Some(value),
                Ok(Err(e)) => {
                    warn!(field, error = %e, "field worker failed, leaving field empty");
                    None
                }
                Err(_) => {
                    warn!(field, "field worker timed out, leaving field empty");
                    None
                }
            }
        }))
        .await;

        let mut record = ProductRecord::default();
        for value in outcomes.into_iter().flatten() {
            value.apply(&mut record);
        }
        self.finish(record, started.elapsed())
    }

    /// Same record, one field after another on the calling thread.
    pub fn extract_inline(
        &self,
        snapshot: &MarkupSnapshot,
        provider: Option<Arc<dyn SnapshotProvider>>,
    ) -> ProductRecord {
        let started = std::time::Instant::now();
        let document = snapshot.document();
        let base = snapshot.base_url();
        let f = &self.fields;

        let mut record = ProductRecord::default();
        for value in [
            FieldValue::Name(f.name.extract(&document)),
            FieldValue::Rating(f.rating.extract(&document)),
            FieldValue::Price(f.price.extract(&document)),
            FieldValue::Features(f.features.extract(&document)),
            FieldValue::SpecTable(f.spec_table.extract(&document)),
            FieldValue::Images(f.images.extract(&document, base)),
            FieldValue::ManufacturerImages(f.manufacturer_images.extract(&document, base)),
            FieldValue::Offers(f.offers.extract(snapshot, provider.as_deref(), self.settle_delay)),
        ] {
            value.apply(&mut record);
        }
        self.finish(record, started.elapsed())
    }

    fn spawn<F>(&self, snapshot: &MarkupSnapshot, work: F) -> JoinHandle<FieldValue>
    where
        F: FnOnce(&FieldExtractors, &MarkupSnapshot) -> FieldValue + Send + 'static,
    {
        let fields = Arc::clone(&self.fields);
        let snapshot = snapshot.clone();
        tokio::task::spawn_blocking(move || work(&fields, &snapshot))
    }

    fn finish(&self, mut record: ProductRecord, elapsed: Duration) -> ProductRecord {
        record.ai_review_summary = Some(self.summary.summarize(&record));
        debug!(summary = ?record.ai_review_summary, "summary composed");

        info!(
            name = record.product_name.is_some(),
            price = record.selling_price.is_some(),
            offers = record.bank_offers.len(),
            bullets = record.about_this_item.len(),
            specs = record.product_information.len(),
            images = record.product_images.len(),
            manufacturer_images = record.manufacturer_images.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "extraction complete"
        );
        record
    }
}
