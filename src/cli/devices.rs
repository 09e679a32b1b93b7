use anyhow::Result;
use cdp_adapter::DeviceProfile;
use clap::Args;

#[derive(Args, Clone, Debug)]
pub struct DevicesArgs {
    /// Show dimensions and scale next to each id
    #[arg(short, long)]
    pub long: bool,
}

pub fn cmd_devices(args: DevicesArgs) -> Result<()> {
    for id in DeviceProfile::ids() {
        match DeviceProfile::find(&id) {
            Some(device) if args.long => println!(
                "{:<28} {}x{} @{}x{}",
                id,
                device.width,
                device.height,
                device.scale,
                if device.mobile { " mobile" } else { "" }
            ),
            _ => println!("{id}"),
        }
    }
    Ok(())
}
