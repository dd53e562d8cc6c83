use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::{eyre, Result, WrapErr};
use log::info;

use finvo::api::FinvoClient;
use finvo::configure::{self, AppConfig};
use finvo::dashboard::{self, DashboardFilter, YearMonth};
use finvo::history::{self, HistoryFilter, HistoryTab, OwnedAccounts, Statement};
use finvo::logger;
use finvo::transfer::receipt::format_euros;
use finvo::transfer::{
    CancelOutcome, ConfirmationState, ControllerConfig, HttpTransferService, TransferConfirmation,
    TransferRequest,
};
use finvo::wizard::{self, ExternalTransferForm, InternalTransferForm};

#[derive(Parser)]
#[command(name = "finvo")]
#[command(author, version, about = "FINVO banking client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and print the session to export
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List the signed-in user's accounts
    Accounts,
    /// List saved beneficiaries
    Beneficiaries {
        #[arg(long)]
        search: Option<String>,
    },
    /// Balance, income and expense summary
    Dashboard {
        /// YYYY-MM
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        account: Option<u64>,
    },
    /// Transaction history grouped by day
    History {
        /// YYYY-MM
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        account: Option<u64>,
        /// all, revenues or expenses
        #[arg(long, default_value = "all")]
        tab: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Write a statement file into this directory
        #[arg(long)]
        statement_dir: Option<PathBuf>,
    },
    /// Send a transfer; Ctrl-C during the countdown cancels it
    Transfer {
        /// Account id to debit
        #[arg(long)]
        from: u64,
        /// Destination account number (own account or saved beneficiary)
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        description: Option<String>,
        /// Request cancellation after this many seconds
        #[arg(long)]
        cancel_after: Option<u64>,
        /// Write the receipt into this directory
        #[arg(long)]
        receipt_dir: Option<PathBuf>,
    },
}

fn parse_month(month: Option<&str>) -> Result<Option<YearMonth>> {
    month
        .map(|m| m.parse::<YearMonth>().map_err(|e| eyre!("{}", e)))
        .transpose()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    let config = configure::load_config().wrap_err("Failed to load config")?;
    logger::setup_logger(&config).map_err(|e| eyre!("Failed to set up logger: {}", e))?;

    let client = FinvoClient::from_config(&config)?;
    info!("FINVO client for {}", client.base_url());

    match cli.command {
        Command::Login { email, password } => login(&client, &email, &password).await,
        Command::Accounts => accounts(&client).await,
        Command::Beneficiaries { search } => beneficiaries(&client, search.as_deref()).await,
        Command::Dashboard { month, account } => {
            let filter = DashboardFilter {
                month: parse_month(month.as_deref())?,
                account_id: account,
            };
            show_dashboard(&client, &filter).await
        }
        Command::History {
            month,
            account,
            tab,
            page,
            statement_dir,
        } => {
            let filter = HistoryFilter {
                account_id: account,
                month: parse_month(month.as_deref())?,
                tab: tab.parse::<HistoryTab>()?,
            };
            show_history(&client, &filter, page, statement_dir).await
        }
        Command::Transfer {
            from,
            to,
            amount,
            description,
            cancel_after,
            receipt_dir,
        } => {
            let request = build_request(&client, from, &to, &amount, description.unwrap_or_default()).await?;
            run_transfer(client, &config, request, cancel_after.map(Duration::from_secs), receipt_dir).await
        }
    }
}

async fn login(client: &FinvoClient, email: &str, password: &str) -> Result<()> {
    let (_, resp) = client.login(email, password).await?;
    println!("Connecté: {} {} <{}>", resp.user.first_name, resp.user.last_name, resp.user.email);
    println!("export FINVO_ACCESS_TOKEN={}", resp.access_token);
    println!("export FINVO_USER_ID={}", resp.user.id);
    Ok(())
}

async fn accounts(client: &FinvoClient) -> Result<()> {
    for account in client.user_accounts().await? {
        println!(
            "{:>4}  {}  {:<16} {:>14}{}",
            account.id,
            account.account_number,
            account.label(),
            format_euros(account.balance),
            if account.is_closed { "  (clôturé)" } else { "" },
        );
    }
    Ok(())
}

async fn beneficiaries(client: &FinvoClient, search: Option<&str>) -> Result<()> {
    let all = client.beneficiaries().await?;
    for b in wizard::search_beneficiaries(&all, search.unwrap_or("")) {
        println!("{:>4}  {}  {}", b.id, b.account_number, b.name);
    }
    Ok(())
}

async fn show_dashboard(client: &FinvoClient, filter: &DashboardFilter) -> Result<()> {
    let stats = client.dashboard_stats().await?;
    let summary = dashboard::summarize(&stats, filter);

    println!("Solde total:   {}", format_euros(summary.total_balance));
    println!("Entrées:       {}", format_euros(summary.total_income));
    println!("Sorties:       {}", format_euros(summary.total_expense));
    println!();

    let filtered = filter.apply(&stats.transactions);
    let today = chrono::Local::now().date_naive();
    for flow in dashboard::cash_flow(&filtered, today) {
        println!(
            "{}  +{:>12}  -{:>12}  = {:>12}",
            flow.month,
            format_euros(flow.income),
            format_euros(flow.expense),
            format_euros(flow.balance),
        );
    }
    Ok(())
}

async fn show_history(
    client: &FinvoClient,
    filter: &HistoryFilter,
    page: usize,
    statement_dir: Option<PathBuf>,
) -> Result<()> {
    let accounts = client.user_accounts().await?;
    let transactions = client.all_transactions().await?;
    let owned = OwnedAccounts::new(&accounts);

    let filtered = filter.apply(&transactions, &owned);
    let groups = history::group_by_day(&filtered);
    for group in history::page(&groups, page) {
        println!("{}", group.day.format("%d/%m/%Y"));
        for t in &group.transactions {
            let sign = if owned.is_expense(t) { "-" } else { "+" };
            println!("    {}{:>12}  {}", sign, format_euros(t.amount), t.description);
        }
    }
    println!("Page {} sur {}", page, history::total_pages(groups.len()).max(1));

    let totals = history::totals(&filtered, &owned);
    println!("Entrées: {}  Sorties: {}", format_euros(totals.entries), format_euros(totals.expenses));

    if let Some(dir) = statement_dir {
        let statement = Statement::build(&transactions, &accounts, filter, chrono::Local::now().date_naive());
        let path = dir.join(statement.file_name());
        std::fs::write(&path, statement.render_text())
            .wrap_err_with(|| format!("writing {}", path.display()))?;
        println!("Relevé enregistré: {}", path.display());
    }
    Ok(())
}

/// Route to the internal or external form depending on who owns `to`
async fn build_request(
    client: &FinvoClient,
    from: u64,
    to: &str,
    amount: &str,
    description: String,
) -> Result<TransferRequest> {
    let accounts = client.user_accounts().await?;
    if accounts.iter().any(|a| a.account_number == to.trim()) {
        let form = InternalTransferForm {
            source_account_id: Some(from),
            destination_account_number: to.to_string(),
            amount: amount.to_string(),
            description,
        };
        return Ok(wizard::validate_internal(&form, &accounts)?);
    }

    let beneficiaries = client.beneficiaries().await?;
    let beneficiary = beneficiaries
        .iter()
        .find(|b| b.account_number == to.trim())
        .ok_or_else(|| eyre!("{} n'est ni un de vos comptes ni un bénéficiaire enregistré", to))?;
    let form = ExternalTransferForm {
        source_account_id: Some(from),
        beneficiary_id: Some(beneficiary.id),
        amount: amount.to_string(),
        description,
    };
    Ok(wizard::validate_external(&form, &accounts, &beneficiaries)?)
}

/// 20-cell bar, filled as the window elapses
fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) / 5;
    format!("{}{}", "#".repeat(filled), "-".repeat(20 - filled))
}

async fn run_transfer(
    client: FinvoClient,
    config: &AppConfig,
    request: TransferRequest,
    cancel_after: Option<Duration>,
    receipt_dir: Option<PathBuf>,
) -> Result<()> {
    let service = Arc::new(HttpTransferService::new(client));
    let confirmation = TransferConfirmation::new(service, ControllerConfig::from(config));
    let mut rx = confirmation.subscribe();

    println!("Virement de {} vers {}...", format_euros(request.amount()), request.destination_account_number());
    let state = confirmation.start(request).await;
    if let ConfirmationState::Failed { error } = &state {
        return Err(eyre!("{}", error.message()));
    }

    let cancel_timer = async {
        match cancel_after {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(cancel_timer);

    let window_secs = confirmation.window_secs();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        let Some(remaining) = snapshot.remaining() else { break };
        let progress = snapshot.window().map_or(0, |w| w.progress_percent(window_secs));
        println!(
            "[{}] Annulation possible pendant {} s (Ctrl-C pour annuler)",
            progress_bar(progress),
            remaining
        );

        let cancel = tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                false
            }
            _ = tokio::signal::ctrl_c() => true,
            _ = &mut cancel_timer => true,
        };

        if cancel {
            match confirmation.request_cancel().await {
                CancelOutcome::Cancelled => println!("Virement annulé"),
                CancelOutcome::Rejected { reason: Some(reason) } => println!("Annulation refusée: {}", reason),
                CancelOutcome::Rejected { reason: None } | CancelOutcome::Ignored => {}
            }
            break;
        }
    }

    match confirmation.state() {
        ConfirmationState::Cancelled { result } => {
            println!("Transaction #{} annulée", result.transaction_id);
            return Ok(());
        }
        state if state.is_settled() => {
            println!("Virement confirmé (transaction #{})", state.transaction_id().map_or(0, |id| id.as_u64()));
        }
        state => println!("État: {}", state.phase()),
    }

    if let Some(receipt) = confirmation.receipt() {
        print!("{}", receipt.render_text());
        if let Some(dir) = receipt_dir {
            let path = dir.join(receipt.file_name());
            std::fs::write(&path, receipt.render_text())
                .wrap_err_with(|| format!("writing {}", path.display()))?;
            println!("Reçu enregistré: {}", path.display());
        }
    }
    Ok(())
}
