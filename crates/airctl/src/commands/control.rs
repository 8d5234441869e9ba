//! Power, mode, and fan speed commands.

use airctl_core::{FanSpeed, Mode};

use super::{PurifierClient, wait_connected};
use crate::cli::{GlobalOpts, ModeArgs, SpeedArgs};
use crate::error::CliError;
use crate::output;

pub async fn turn_on(client: &PurifierClient, global: &GlobalOpts) -> Result<(), CliError> {
    wait_connected(client, global).await?;
    client.turn_on().await?;
    output::print_output("Purifier turned on", global.quiet);
    Ok(())
}

pub async fn turn_off(client: &PurifierClient, global: &GlobalOpts) -> Result<(), CliError> {
    wait_connected(client, global).await?;
    client.turn_off().await?;
    output::print_output("Purifier turned off", global.quiet);
    Ok(())
}

pub async fn set_mode(
    client: &PurifierClient,
    args: ModeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mode = Mode::from(args.mode);
    wait_connected(client, global).await?;
    client.set_preset_mode(mode).await?;
    output::print_output(&format!("Mode set to {mode}"), global.quiet);
    Ok(())
}

pub async fn set_speed(
    client: &PurifierClient,
    args: SpeedArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let speed = FanSpeed::from(args.speed);
    wait_connected(client, global).await?;
    client.set_manual_speed(speed).await?;
    output::print_output(&format!("Fan speed set to {speed}"), global.quiet);
    Ok(())
}
