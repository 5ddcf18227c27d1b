//! Minimal end-to-end run of the mining pipeline over a small inline log
//! sample, grounded in the teacher's `examples/drain3_demo.rs` (same
//! config-load-or-default, line-by-line driving, summary printout), but
//! reading its lines from a literal slice instead of downloading a dataset.

use std::io::Cursor;
use std::path::Path;

use drain3::config::TemplateMinerConfig;
use drain3::driver::ParseDriver;
use drain3::format::LogFormat;
use drain3::output::OutputAssembler;
use drain3::store::{EventTemplateTable, LogStore, MemoryLogStore};
use drain3::template_miner::TemplateMiner;

const SAMPLE_LOG: &str = "\
2023-06-01 08:00:01 INFO: Connected to 10.0.0.1
2023-06-01 08:00:02 INFO: Connected to 10.0.0.2
2023-06-01 08:00:03 INFO: Connected to 10.0.0.3
2023-06-01 08:00:04 WARN: Disconnect from 10.0.0.1
2023-06-01 08:00:05 INFO: user alice login
2023-06-01 08:00:06 INFO: user bob login
2023-06-01 08:00:07 INFO: user carol login
2023-06-01 08:00:08 this line does not match the configured format at all
";

fn main() -> anyhow::Result<()> {
    let config_path = "demos/drain3.toml";
    let config = if Path::new(config_path).exists() {
        TemplateMinerConfig::load(config_path).unwrap_or_default()
    } else {
        eprintln!("config file not found at {config_path}, using defaults");
        TemplateMinerConfig::default()
    };

    let format = LogFormat::compile("<Date> <Time> <Level>: <Content>")?;
    let miner = TemplateMiner::new(&config, None)?;
    let mut driver = ParseDriver::new(format, miner);

    driver.process_lines(Cursor::new(SAMPLE_LOG))?;

    let mut event_store: MemoryLogStore<EventTemplateTable> = MemoryLogStore::new();
    let mut assembler = OutputAssembler::new(config.parameter_extraction_cache_capacity);
    let structured = driver.finish(&mut assembler, &mut event_store)?;

    println!("mined {} clusters from {} lines", driver.drain().clusters().len(), structured.rows.len());
    for row in &event_store.get()?.rows {
        println!(
            "EventId {:<4} Occurrences {:<4} {}",
            row.event_id, row.occurrences, row.event_template
        );
    }

    Ok(())
}
