use anyhow::Context;
use clap::Parser;
use place_constraints::utils::error::ErrorSeverity;
use place_constraints::utils::logger;
use place_constraints::{
    load_default_places, AppConfig, CliConfig, ConstraintError, ConstraintExtractor,
    ConstraintPipeline, ExtractionStatus, OpenAiService, ServiceErrorPolicy,
};
use std::io::Read;

fn exit_code(e: &ConstraintError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: ConstraintError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(&e));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    // 設定は起動時に一度だけ解決する。API キーがなければここで終了
    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| fail(e));
    if let Some(locale) = cli.locale {
        config.extract.locale = locale;
    }
    if cli.fallback_on_service_error {
        config.extract.on_service_error = ServiceErrorPolicy::FallbackToDefaults;
    }

    let defaults = match &cli.defaults {
        Some(path) => load_default_places(path).unwrap_or_else(|e| fail(e)),
        None => Vec::new(),
    };

    let user_text = match cli.input {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read user text from stdin")?;
            buf
        }
    };

    let service = OpenAiService::new(&config).unwrap_or_else(|e| fail(e));
    let extractor = ConstraintExtractor::new(service, config.extract.locale);
    let pipeline = ConstraintPipeline::new(extractor, config.extract.on_service_error);

    let report = pipeline
        .run(&defaults, &user_text)
        .await
        .unwrap_or_else(|e| fail(e));

    match &report.status {
        ExtractionStatus::Parsed { rejected, .. } if *rejected > 0 => {
            tracing::warn!("⚠️ {} extracted entries were dropped by validation", rejected);
        }
        ExtractionStatus::ParseFailed { raw_output } => {
            tracing::warn!("⚠️ AI output was not valid JSON, using defaults only");
            eprintln!("⚠️ JSON形式に変換できませんでした:\n{}", raw_output);
        }
        ExtractionStatus::ServiceFailed { message } => {
            tracing::warn!("⚠️ AI service failed ({}), using defaults only", message);
        }
        ExtractionStatus::Parsed { .. } => {}
    }

    let output = serde_json::to_string_pretty(&report.constraints)
        .context("failed to serialize merged constraints")?;
    println!("{}", output);

    Ok(())
}
