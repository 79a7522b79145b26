use std::sync::Arc;

use formpilot_core::{FillOptions, Profile};
use formpilot_engine::{ChromiumSession, FillOrchestrator, FillTiming, FrameExecutor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com/careers/apply".to_string());

    let profile = Profile::default()
        .with_field("firstName", "Ada")
        .with_field("lastName", "Lovelace")
        .with_field("email", "ada@example.com")
        .with_field("phone", "+1 555 0100")
        .with_field("location", "London, UK")
        .with_field("currentTitle", "Senior Software Engineer")
        .with_field("summary", "Engineer with a background in numerical computing.");

    let timing = FillTiming::patient();
    let session = ChromiumSession::launch(false, timing.clone()).await?;

    println!("🌐 Opening {url}...");
    let page = session.open(&url).await?;

    let executor = FrameExecutor::new(Arc::new(page), timing.clone());
    let orchestrator = FillOrchestrator::new(executor, timing);

    let report = orchestrator.test_platform_compatibility().await?;
    println!("\n=== Platform ===");
    println!("  {}", report.platform);
    println!(
        "  {} forms, {} visible inputs",
        report.form_analysis.form_count, report.form_analysis.visible_inputs
    );
    for challenge in &report.challenges {
        println!("  ⚠️ {challenge}");
    }

    println!("\n✍️ Filling application...");
    let result = orchestrator.run(&profile, &FillOptions::default()).await;

    if result.success {
        println!("\n✨ All phases completed.");
    } else {
        println!("\n❌ Finished with {} error(s):", result.errors.len());
        for error in &result.errors {
            println!("  - {error}");
        }
    }

    Ok(())
}
