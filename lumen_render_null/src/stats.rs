/// Command statistics of a null backend

use colored::*;

/// Counters of the commands a `NullRenderBackend` received
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStats {
    pub states_created: u32,
    pub buffers_created: u32,
    pub pipelines_created: u32,
    pub queries_created: u32,
    pub binds: u32,
    pub draws: u32,
    pub dispatches: u32,
    /// Calls rejected by the backend
    pub failures: u32,
}

impl CommandStats {
    /// Total number of commands received
    pub fn total(&self) -> u32 {
        self.states_created
            + self.buffers_created
            + self.pipelines_created
            + self.queries_created
            + self.binds
            + self.draws
            + self.dispatches
    }
}

/// Print a colored report of `stats`
pub fn print_command_stats_report(stats: &CommandStats) {
    if stats.total() == 0 {
        println!("\n{}", "✓ No commands recorded".green().bold());
        return;
    }

    println!("\n{}", "=== Null Backend Command Report ===".bright_blue().bold());

    let rows = [
        ("States:", stats.states_created),
        ("Buffers:", stats.buffers_created),
        ("Pipelines:", stats.pipelines_created),
        ("Queries:", stats.queries_created),
        ("Binds:", stats.binds),
        ("Draws:", stats.draws),
        ("Dispatches:", stats.dispatches),
    ];
    for (label, count) in rows {
        if count > 0 {
            println!("  {} {}", label.cyan(), count);
        }
    }
    if stats.failures > 0 {
        println!("  {} {}", "Failures:".red().bold(), stats.failures);
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());
    println!("{}\n", "===================================".bright_blue().bold());
}
