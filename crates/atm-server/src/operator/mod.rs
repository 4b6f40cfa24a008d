//! The AS operator console (`§4.7`).
//!
//! A REPL reading stdin, grounded in the teacher's `cli` crate (`clap` +
//! `colored` + `tabled`) but talking to the in-process [`AccountStore`]
//! directly rather than a remote admin API, since this system has no
//! network surface to speak of.

pub mod commands;

use std::sync::Arc;

use atm_store::{CardState, NewAccount};
use colored::Colorize;
use tabled::{Table, Tabled};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::config::{ADMIN_EXIT_PASSWORD, TRANSFER_CEILING};
use crate::state::AppState;
use commands::OperatorCommand;

/// Runs until the operator issues `quit` or stdin closes. A login that
/// matches the reserved exit password terminates the process immediately
/// with exit code 1, skipping the save (`§6`).
pub async fn run(state: Arc<AppState>, admin_password: String) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("{}", "Admin password: ".dimmed());
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let Ok(Some(entered)) = lines.next_line().await else {
            return;
        };
        if entered == ADMIN_EXIT_PASSWORD {
            info!("admin entered the reserved exit password, terminating without saving");
            std::process::exit(1);
        }
        if entered == admin_password {
            break;
        }
        println!("{}", "Incorrect password.".red());
    }

    println!("{}", "ATM operator console. Type 'quit' to save and exit.".green());

    loop {
        print!("> ");
        let _ = std::io::Write::flush(&mut std::io::stdout());
        let Ok(Some(line)) = lines.next_line().await else {
            state.save().await;
            return;
        };
        if line.trim().is_empty() {
            continue;
        }

        match commands::parse(line.trim()) {
            Ok(OperatorCommand::Quit) => {
                state.save().await;
                println!("{}", "Saved. Goodbye.".green());
                return;
            }
            Ok(command) => execute(&state, command, &mut lines).await,
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}

async fn execute(
    state: &AppState,
    command: OperatorCommand,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
) {
    let store = &state.dispatcher.store;
    let now = chrono::Local::now().naive_local();

    match command {
        OperatorCommand::Create => match create_account(store, lines, now).await {
            Ok(id) => println!("{} {id}", "created account".green()),
            Err(e) => println!("{}", e.to_string().red()),
        },
        OperatorCommand::Update { account_id, field, value } => match update_field(store, account_id, &field, &value) {
            Ok(()) => println!("{}", "updated".green()),
            Err(e) => println!("{}", e.red()),
        },
        OperatorCommand::View { account_id } => match store.lookup_by_id(account_id) {
            Ok(handle) => print_statement(&handle),
            Err(e) => println!("{}", e.to_string().red()),
        },
        OperatorCommand::Withdraw { account_id, amount } => {
            match store.lookup_by_id(account_id).and_then(|h| h.write().withdraw(amount, now).map(|_| ())) {
                Ok(()) => println!("{}", "done".green()),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        OperatorCommand::Deposit { account_id, amount } => {
            match store.lookup_by_id(account_id).and_then(|h| h.write().deposit(amount, now).map(|_| ())) {
                Ok(()) => println!("{}", "done".green()),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        OperatorCommand::Transfer { from, to, amount } => {
            if amount >= TRANSFER_CEILING {
                println!("{}", format!("amount must be strictly less than {TRANSFER_CEILING:.2}").red());
                return;
            }
            let from_account = match store.lookup_by_id(from) {
                Ok(h) => h,
                Err(e) => return println!("{}", e.to_string().red()),
            };
            let to_account = match store.lookup_by_id(to) {
                Ok(h) => h,
                Err(e) => return println!("{}", e.to_string().red()),
            };
            let from_rfid = from_account.read().rfid.clone();
            let to_rfid = to_account.read().rfid.clone();
            match store.transfer(&from_rfid, &to_rfid, amount, now) {
                Ok(()) => println!("{}", "transferred".green()),
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        OperatorCommand::Block { account_id } => match store.lookup_by_id(account_id) {
            Ok(h) => {
                h.write().block();
                println!("{}", "blocked".green());
            }
            Err(e) => println!("{}", e.to_string().red()),
        },
        OperatorCommand::Unblock { account_id } => match store.lookup_by_id(account_id) {
            Ok(h) => {
                h.write().unblock();
                println!("{}", "unblocked".green());
            }
            Err(e) => println!("{}", e.to_string().red()),
        },
        OperatorCommand::List => print_table(store.all_accounts()),
        OperatorCommand::Search { query } => print_table(store.search(&query)),
        OperatorCommand::Quit => unreachable!("handled by the caller"),
    }
}

async fn create_account(
    store: &atm_store::AccountStore,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    now: chrono::NaiveDateTime,
) -> atm_store::Result<u64> {
    let holder_name = prompt(lines, "Holder name: ").await;
    let phone: u64 = prompt(lines, "Phone: ").await.parse().unwrap_or(0);
    let username = prompt(lines, "Username: ").await;
    let password = prompt(lines, "Password: ").await;
    let rfid = prompt(lines, "RFID: ").await;
    let pin = prompt(lines, "PIN: ").await;
    let opening_balance: f64 = prompt(lines, "Opening balance: ").await.parse().unwrap_or(0.0);

    store.create_account(
        NewAccount {
            holder_name,
            phone,
            username,
            password,
            rfid,
            pin,
            opening_balance,
        },
        now,
    )
}

async fn prompt(lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>, label: &str) -> String {
    print!("{label}");
    let _ = std::io::Write::flush(&mut std::io::stdout());
    lines.next_line().await.ok().flatten().unwrap_or_default()
}

fn update_field(store: &atm_store::AccountStore, account_id: u64, field: &str, value: &str) -> Result<(), String> {
    use atm_store::validation;

    if field == "username" {
        return store.rename_username(account_id, value.to_string()).map_err(|e| e.to_string());
    }

    let handle = store.lookup_by_id(account_id).map_err(|e| e.to_string())?;
    let mut account = handle.write();
    match field {
        "phone" => {
            let phone: u64 = value.parse().map_err(|_| "phone must be numeric".to_string())?;
            account.phone = validation::validate_phone(phone).map_err(|e| e.to_string())?;
        }
        "name" | "holder_name" => {
            account.holder_name = validation::validate_holder_name(value).map_err(|e| e.to_string())?;
        }
        "password" => {
            account.password = validation::validate_password(value).map_err(|e| e.to_string())?;
        }
        "pin" => {
            account.set_pin(value).map_err(|e| e.to_string())?;
        }
        other => return Err(format!("unsupported field '{other}'")),
    }
    Ok(())
}

#[derive(Tabled)]
struct AccountRow {
    id: u64,
    holder_name: String,
    username: String,
    phone: u64,
    rfid: String,
    card_state: String,
    balance: String,
}

fn print_table(handles: Vec<atm_store::AccountHandle>) {
    let rows: Vec<AccountRow> = handles
        .iter()
        .map(|h| {
            let a = h.read();
            AccountRow {
                id: a.account_id,
                holder_name: a.holder_name.clone(),
                username: a.username.clone(),
                phone: a.phone,
                rfid: a.rfid.clone(),
                card_state: match a.card_state {
                    CardState::Active => "ACTIVE".to_string(),
                    CardState::Blocked => "BLOCKED".to_string(),
                },
                balance: format!("{:.2}", a.balance),
            }
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn print_statement(handle: &atm_store::AccountHandle) {
    let account = handle.read();
    println!(
        "{} balance={:.2} state={:?}",
        account.holder_name, account.balance, account.card_state
    );
    for txn in account.history() {
        println!("  {} {:>10.2} {:?}", txn.display_timestamp(), txn.amount, txn.kind);
    }
}
