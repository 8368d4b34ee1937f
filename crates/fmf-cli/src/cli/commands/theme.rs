//! Theme command handlers.

use anyhow::Result;
use fmf_core::services::Services;
use fmf_core::theme::Theme;

pub fn show(services: &Services) {
    println!("{}", services.theme.current());
}

pub fn toggle(services: &Services) -> Result<()> {
    let theme = services.theme.toggle()?;
    println!("{theme}");
    Ok(())
}

pub fn set(services: &Services, theme: Theme) -> Result<()> {
    services.theme.set(theme)?;
    println!("{theme}");
    Ok(())
}
