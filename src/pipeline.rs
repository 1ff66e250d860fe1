//! Batch processing: parse every statement in parallel, then fold the results into one
//! report on a single thread.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::aggregate;
use crate::document::StatementDocument;
use crate::error::{AuditError, FailureKind, Result};
use crate::extractor::extract_table;
use crate::gaps::analyze;
use crate::loader::StatementFile;
use crate::metadata::extract_metadata;
use crate::models::{
    CanonicalTransaction, CoverageGroup, CoverageRecord, HierarchyKey, LedgerRow, MonthStamp,
    StatementMetadata,
};
use crate::profiles::{LayoutRegistry, StatementLayout};
use crate::standardizer::standardize;
use crate::validator::{reconcile, ValidationResult};

/// Everything learned from one statement document.
#[derive(Debug, Clone)]
pub struct StatementOutcome {
    pub metadata: StatementMetadata,
    pub transactions: Vec<CanonicalTransaction>,
    pub validation: ValidationResult,
}

/// Extract, standardize and reconcile one document.
pub fn process_statement<D: StatementDocument + ?Sized>(
    doc: &D,
    layout: &StatementLayout,
) -> Result<StatementOutcome> {
    let table = extract_table(doc, layout)?;
    let metadata = extract_metadata(doc, layout)?;
    if metadata.opening_defaulted {
        debug!(layout = %layout.key(), "no opening balance printed, assuming 0.00");
    }
    let transactions = standardize(&table, &layout.mapping, metadata.reference_year)?;
    let validation = reconcile(
        &transactions,
        metadata.opening_balance,
        metadata.closing_balance,
    );
    Ok(StatementOutcome {
        metadata,
        transactions,
        validation,
    })
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Worker threads; 0 lets rayon pick one per CPU.
    pub jobs: usize,
    /// Keep transactions of statements that fail reconciliation.
    pub keep_unreconciled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementSummary {
    pub source: String,
    pub key: HierarchyKey,
    pub account_type: String,
    pub reference_year: i32,
    pub transactions: usize,
    pub opening_balance: f64,
    pub closing_balance: f64,
    pub calculated_balance: f64,
    pub reconciled: bool,
    /// False when an unreconciled statement was held back from the ledger.
    pub included: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub source: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Duplicate {
    pub source: String,
    pub original: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    #[serde(skip)]
    pub ledger: Vec<LedgerRow>,
    pub statements: Vec<StatementSummary>,
    pub failures: Vec<Failure>,
    pub duplicates: Vec<Duplicate>,
    pub coverage: Vec<CoverageGroup>,
}

impl BatchReport {
    pub fn failure_counts(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for f in &self.failures {
            *counts.entry(f.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn reconciled(&self) -> usize {
        self.statements.iter().filter(|s| s.reconciled).count()
    }

    /// Number of sub-folder levels below the institution, shared by every key.
    pub fn depth(&self) -> usize {
        self.coverage
            .iter()
            .map(|g| g.key.depth())
            .chain(self.ledger.iter().map(|r| r.key.depth()))
            .max()
            .unwrap_or(0)
    }
}

/// What the map phase hands back for one file.
pub struct DocumentResult {
    pub checksum: Option<String>,
    pub outcome: Result<StatementOutcome>,
}

/// Single-threaded reduce state.
pub struct BatchAccumulator {
    options: BatchOptions,
    report: BatchReport,
    coverage: Vec<CoverageRecord>,
    checksums: HashMap<String, String>,
}

impl BatchAccumulator {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            report: BatchReport::default(),
            coverage: Vec::new(),
            checksums: HashMap::new(),
        }
    }

    pub fn record(&mut self, file: &StatementFile, result: DocumentResult) {
        if let Some(sum) = result.checksum {
            if let Some(original) = self.checksums.get(&sum) {
                info!(source = %file.source, original = %original, "duplicate statement, skipping");
                self.report.duplicates.push(Duplicate {
                    source: file.source.clone(),
                    original: original.clone(),
                });
                return;
            }
            self.checksums.insert(sum, file.source.clone());
        }

        let outcome = match result.outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.fail(file, &e);
                return;
            }
        };

        let reconciled = outcome.validation.is_reconciled;
        let included = reconciled || self.options.keep_unreconciled;
        if !reconciled {
            let err = AuditError::ValidationMismatch {
                opening: outcome.validation.opening_balance,
                closing: outcome.validation.closing_balance,
                calculated: outcome.validation.calculated_balance,
            };
            self.fail(file, &err);
        }

        self.report.statements.push(StatementSummary {
            source: file.source.clone(),
            key: file.key.clone(),
            account_type: file.account_type.unwrap_or_default().to_string(),
            reference_year: outcome.metadata.reference_year,
            transactions: outcome.transactions.len(),
            opening_balance: outcome.validation.opening_balance,
            closing_balance: outcome.validation.closing_balance,
            calculated_balance: outcome.validation.calculated_balance,
            reconciled,
            included,
        });

        let mut months: Vec<MonthStamp> = outcome
            .transactions
            .iter()
            .map(|t| MonthStamp::from_date(t.date))
            .collect();
        if months.is_empty() {
            // A statement with no activity still covers its own month.
            months.extend(file.file_month.or(outcome.metadata.period_end));
        }
        self.coverage.extend(months.into_iter().map(|month| CoverageRecord {
            key: file.key.clone(),
            month,
        }));

        if !included {
            info!(source = %file.source, "unreconciled statement excluded from ledger");
            return;
        }
        for txn in outcome.transactions {
            self.report.ledger.push(LedgerRow {
                key: file.key.clone(),
                transaction: txn,
                source: file.source.clone(),
            });
        }
    }

    fn fail(&mut self, file: &StatementFile, err: &AuditError) {
        warn!(source = %file.source, kind = %err.kind(), "{err}");
        self.report.failures.push(Failure {
            source: file.source.clone(),
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    /// Build coverage groups and their gaps from everything recorded.
    pub fn finish(mut self) -> BatchReport {
        let mut groups = aggregate(&self.coverage);
        analyze(&mut groups);
        self.report.coverage = groups;
        self.report
    }
}

fn process_file<D, F>(file: &StatementFile, registry: &LayoutRegistry, open: &F) -> DocumentResult
where
    D: StatementDocument,
    F: Fn(&Path) -> Result<D>,
{
    let layout = match file.account_type {
        Some(account_type) => registry.lookup(&file.institution, account_type),
        None => Err(AuditError::UnknownStatementType(format!(
            "{}: no registered account type in path",
            file.source
        ))),
    };
    let layout = match layout {
        Ok(layout) => layout,
        Err(e) => {
            return DocumentResult {
                checksum: None,
                outcome: Err(e),
            }
        }
    };

    match open(&file.path) {
        Ok(doc) => DocumentResult {
            checksum: doc.checksum().map(str::to_string),
            outcome: process_statement(&doc, layout),
        },
        Err(e) => DocumentResult {
            checksum: None,
            outcome: Err(e),
        },
    }
}

/// Parse every file on a worker pool, then reduce in input order.
pub fn run_batch<D, F>(
    files: &[StatementFile],
    registry: &LayoutRegistry,
    options: &BatchOptions,
    open: F,
) -> Result<BatchReport>
where
    D: StatementDocument,
    F: Fn(&Path) -> Result<D> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()
        .map_err(|e| AuditError::Other(format!("could not start worker pool: {e}")))?;

    let results: Vec<DocumentResult> = pool.install(|| {
        files
            .par_iter()
            .map(|file| process_file(file, registry, &open))
            .collect()
    });

    let mut acc = BatchAccumulator::new(options.clone());
    for (file, result) in files.iter().zip(results) {
        acc.record(file, result);
    }
    let report = acc.finish();
    info!(
        statements = report.statements.len(),
        failures = report.failures.len(),
        duplicates = report.duplicates.len(),
        "batch complete"
    );
    Ok(report)
}

/// Coverage from file-name months alone, without opening any document.
pub fn filename_coverage(files: &[StatementFile]) -> Vec<CoverageGroup> {
    let records: Vec<CoverageRecord> = files
        .iter()
        .filter_map(|f| {
            f.file_month.map(|month| CoverageRecord {
                key: f.key.clone(),
                month,
            })
        })
        .collect();
    let mut groups = aggregate(&records);
    analyze(&mut groups);
    groups
}
