use crate::print_info;
use colored::*;
use tip3_vm::{CodeKind, CodeRegistry, SimConfig};

fn kind_label(kind: &CodeKind) -> &'static str {
    match kind {
        CodeKind::Account => "account",
        CodeKind::WalletCallback => "wallet callback",
        CodeKind::RootTransferCallback => "ownership callback",
        CodeKind::TokenRoot { upgradeable: false } => "token root",
        CodeKind::TokenRoot { upgradeable: true } => "token root (upgradeable)",
        CodeKind::TokenWallet { upgradeable: false } => "token wallet",
        CodeKind::TokenWallet { upgradeable: true } => "token wallet (upgradeable)",
        CodeKind::WalletPlatform => "wallet platform",
    }
}

pub fn handle(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let codes = CodeRegistry::standard();
    if json {
        let list: Vec<_> = codes.iter().collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    print_info(&format!("{} code artifacts", codes.len()));
    println!();
    for code in codes.iter() {
        println!(
            "{:<28} {:<28} v{:<3} {}",
            code.name.bold(),
            kind_label(&code.kind).cyan(),
            code.version,
            code.hash.to_string().dimmed()
        );
    }
    Ok(())
}

pub fn show_config(config: &SimConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
