use crate::{print_error, print_info, print_success};
use colored::*;
use std::path::PathBuf;
use tip3_vm::scenario::{self, Scenario, ScenarioReport, ScenarioRunner};
use tip3_vm::SimConfig;

pub fn handle(
    config: &SimConfig,
    files: &[PathBuf],
    keep_going: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = ScenarioRunner::new(config.clone());
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        let scenario = Scenario::load_from_file(file)
            .map_err(|e| format!("{}: {}", file.display(), e))?;
        if !json {
            print_info(&format!("Running {} ({})", scenario.name.bold(), file.display()));
        }
        let report = runner.run(&scenario)?;
        let passed = report.passed;
        if !json {
            print_report(&report);
        }
        reports.push(report);
        if !passed && !keep_going {
            break;
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    let failed = reports.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        return Err(format!("{} of {} scenarios failed", failed, reports.len()).into());
    }
    if !json {
        print_success(&format!("{} scenarios passed", reports.len()));
    }
    Ok(())
}

pub fn demo(config: &SimConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = scenario::demo()?;
    let report = ScenarioRunner::new(config.clone()).run(&scenario)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    if !report.passed {
        return Err("demo scenario failed".into());
    }
    Ok(())
}

fn print_report(report: &ScenarioReport) {
    for step in &report.steps {
        let mark = if step.passed { "✓".green() } else { "✗".red() };
        println!("  {} #{:<3} {}", mark, step.index, step.action);
        if let Some(detail) = &step.detail {
            println!("        {}", detail.red());
        }
    }
    if report.passed {
        print_success(&format!("{}: {} steps", report.name, report.steps.len()));
    } else {
        print_error(&format!("{}: failed", report.name));
    }
}
