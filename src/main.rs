use chrono::{DateTime, Utc};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tutorpay::application::ledger::EarningsLedger;
use tutorpay::application::retention::RetentionCalculator;
use tutorpay::application::settlement::SettlementProcessor;
use tutorpay::application::tiers::TierEngine;
use tutorpay::config::LedgerConfig;
use tutorpay::domain::ports::{
    ApplicationStoreRef, BatchStoreRef, EarningStoreRef, LessonStoreRef, NotificationOutboxRef,
    PaymentRailRef, TeacherStoreRef, TierHistoryStoreRef,
};
use tutorpay::domain::teacher::TeacherProfile;
use tutorpay::domain::tier::TierRegistry;
use tutorpay::infrastructure::in_memory::{
    InMemoryApplicationStore, InMemoryBatchStore, InMemoryEarningStore, InMemoryLessonStore,
    InMemoryOutbox, InMemoryTeacherStore, InMemoryTierHistoryStore,
};
use tutorpay::infrastructure::stub_rail::StubPaymentRail;
use tutorpay::interfaces::csv::lesson_reader::LessonReader;
use tutorpay::interfaces::csv::report_writer::{ReportRow, ReportWriter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Lesson-completion events CSV file
    input: PathBuf,

    /// Hold period applied to new earnings, in days
    #[arg(long, default_value_t = 7)]
    hold_days: i64,

    /// Run the hold sweep and one settlement cycle after ingestion
    #[arg(long)]
    settle: bool,

    /// Provision unseen teachers without a verified payout account, so the
    /// settlement cycle skips them
    #[arg(long)]
    unverified_teachers: bool,

    /// Clock override (RFC 3339) for deterministic runs
    #[arg(long)]
    as_of: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let now = match &cli.as_of {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .into_diagnostic()?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let config = LedgerConfig::default().with_hold_period_days(cli.hold_days);
    let registry = Arc::new(TierRegistry::standard());

    let teachers: TeacherStoreRef = Arc::new(InMemoryTeacherStore::new());
    let lessons: LessonStoreRef = Arc::new(InMemoryLessonStore::new());
    let earnings: EarningStoreRef = Arc::new(InMemoryEarningStore::new());
    let batches: BatchStoreRef = Arc::new(InMemoryBatchStore::new());
    let applications: ApplicationStoreRef = Arc::new(InMemoryApplicationStore::new());
    let history: TierHistoryStoreRef = Arc::new(InMemoryTierHistoryStore::new());
    let outbox: NotificationOutboxRef = Arc::new(InMemoryOutbox::new());
    let rail: PaymentRailRef = Arc::new(StubPaymentRail::new());

    let ledger = EarningsLedger::new(
        teachers.clone(),
        lessons.clone(),
        earnings.clone(),
        registry.clone(),
        config.clone(),
    );
    let retention = RetentionCalculator::new(teachers.clone(), lessons.clone(), config.clone());
    let tiers = TierEngine::new(
        teachers.clone(),
        history.clone(),
        applications.clone(),
        registry.clone(),
        outbox.clone(),
    );

    // Ingest lesson events, provisioning unseen teachers on the fly. By
    // default each gets a demo payout account so the settlement cycle has
    // somewhere to send money; --unverified-teachers leaves it unset.
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = LessonReader::new(file);
    for lesson_result in reader.lessons() {
        match lesson_result {
            Ok(lesson) => {
                if teachers.get(lesson.teacher_id).await.into_diagnostic()?.is_none() {
                    let mut profile = TeacherProfile::new(lesson.teacher_id);
                    if !cli.unverified_teachers {
                        profile = profile
                            .with_payout_account(format!("acct_{}", lesson.teacher_id));
                    }
                    teachers.upsert(profile).await.into_diagnostic()?;
                }
                if let Err(e) = ledger.record_earning(&lesson, now).await {
                    eprintln!("Error processing lesson: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading lesson: {e}");
            }
        }
    }

    // Refresh derived metrics and re-evaluate every teacher's tier.
    for profile in teachers.all().await.into_diagnostic()? {
        retention.recalculate(profile.id).await.into_diagnostic()?;
        let evaluation = tiers.evaluate(profile.id, now).await.into_diagnostic()?;
        debug!(teacher = %profile.id, ?evaluation, "tier evaluation");
    }

    ledger.sweep(now).await.into_diagnostic()?;

    if cli.settle {
        let processor = SettlementProcessor::new(
            teachers.clone(),
            earnings.clone(),
            batches.clone(),
            rail,
            outbox,
            config,
        );
        processor.run_settlement_cycle(now).await.into_diagnostic()?;
    }

    let mut rows = Vec::new();
    for profile in teachers.all().await.into_diagnostic()? {
        let teacher_earnings = earnings.for_teacher(profile.id).await.into_diagnostic()?;
        let teacher_batches = batches.for_teacher(profile.id).await.into_diagnostic()?;
        rows.push(ReportRow::build(&profile, &teacher_earnings, &teacher_batches));
    }

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_rows(rows).into_diagnostic()?;

    Ok(())
}
