//! Profile CLI commands

use clap::Args;

use crate::display::format_stats;
use crate::error::FinanceResult;
use crate::services::ProfileService;
use crate::storage::Storage;

/// Arguments for `stats`
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Profile to summarise
    #[arg(short, long)]
    pub profile: String,
}

/// Arguments for `rename-profile`
#[derive(Args, Debug)]
pub struct RenameProfileArgs {
    /// Current profile name
    #[arg(short, long)]
    pub profile: String,
    /// New profile name
    #[arg(short, long)]
    pub name: String,
}

/// Handle `stats`
pub fn handle_stats(storage: &Storage, args: StatsArgs) -> FinanceResult<()> {
    let service = ProfileService::new(storage);
    let profile = service.load_profile_by_name(&args.profile)?;
    let stats = service.stats(&profile);
    print!("{}", format_stats(&profile, &stats));
    Ok(())
}

/// Handle `rename-profile`
pub fn handle_rename_profile(storage: &Storage, args: RenameProfileArgs) -> FinanceResult<()> {
    let service = ProfileService::new(storage);
    let profile = service.rename_profile(&args.profile, &args.name)?;
    println!("Renamed profile '{}' to '{}'", args.profile, profile.name);
    Ok(())
}
