//! Limit policy commands.

use super::commands::LimitCommands;
use super::output::emit;
use studyforge::{LimitPolicyUpdate, Studyforge, StudyforgeResult};

/// Handle limit subcommands.
pub async fn handle_limit_command(
    core: &Studyforge,
    cmd: LimitCommands,
    json: bool,
) -> StudyforgeResult<()> {
    match cmd {
        LimitCommands::List => {
            let rows = core.list_limit_policies().await?;
            emit(json, &rows, |rows| {
                for row in rows {
                    println!(
                        "{:<8} {:>8}/day {:>10}/month  ({}) {}",
                        row.tier,
                        row.limits.daily_limit,
                        row.limits.monthly_limit,
                        row.source,
                        row.description.as_deref().unwrap_or("")
                    );
                }
            })
        }
        LimitCommands::Set {
            tier,
            daily,
            monthly,
            description,
        } => {
            let policy = core
                .update_limit_policy(
                    tier,
                    LimitPolicyUpdate {
                        daily_limit: daily,
                        monthly_limit: monthly,
                        description,
                    },
                )
                .await?;
            emit(json, &policy, |p| {
                println!(
                    "{}: {}/day, {}/month",
                    p.tier, p.daily_limit, p.monthly_limit
                )
            })
        }
        LimitCommands::Clear { tier } => {
            let existed = core.deactivate_limit_policy(tier).await?;
            emit(json, &existed, |existed| {
                if *existed {
                    println!("{} reverted to default limits", tier);
                } else {
                    println!("{} had no stored policy", tier);
                }
            })
        }
    }
}
