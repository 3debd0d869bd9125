use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::alerts::ConsoleSink;
use crate::api::FinanceApi;
use crate::board::BudgetBoard;
use crate::config::{Config, ENV_TOKEN};
use crate::format::{format_money, format_percentage, month_name, progress_bar, truncate};
use crate::models::*;

pub fn as_cli(args: &[String], config: &Config) -> Result<()> {
    match args.get(1).map(String::as_str) {
        None | Some("--help" | "-h" | "help") => {
            print_usage();
            Ok(())
        }
        Some("--version" | "-V" | "version") => {
            println!("budgetpulse {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(_) => {
            let mut api = super::connect(config)?;
            let today = chrono::Local::now().date_naive();
            dispatch(args, api.as_mut(), config, today)
        }
    }
}

fn dispatch(args: &[String], api: &mut dyn FinanceApi, config: &Config, today: NaiveDate) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "budgets" | "b" => cli_budgets(rest, api, config, today),
        "set-budget" => cli_set_budget(rest, api, config, today),
        "delete-budget" => cli_delete_budget(rest, api, today),
        "add" => cli_add(rest, api, config, today),
        "transactions" | "t" => cli_transactions(rest, api, config, today),
        "summary" | "s" => cli_summary(rest, api, config, today),
        "categories" => cli_categories(api),
        "add-category" => cli_add_category(rest, api),
        "login" => cli_login(rest, api),
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("BudgetPulse: monthly budgets with spending alerts");
    println!();
    println!("Usage: budgetpulse [--api <url>] [--db <path>] <command>");
    println!();
    println!("Commands:");
    println!("  budgets [YYYY-MM]                       Budgets and progress for a month");
    println!("  set-budget <category> <amount>          Set a monthly budget");
    println!("    --month <YYYY-MM>                     Month (default: current)");
    println!("  delete-budget <id>                      Delete a budget");
    println!("  add <income|expense> <amount> <category> <description>");
    println!("    --date <YYYY-MM-DD>                   Date (default: today)");
    println!("  transactions [YYYY-MM]                  List transactions");
    println!("  summary [YYYY-MM]                       Income, expenses and spending by category");
    println!("  categories                              List categories");
    println!("  add-category <name> [--color <#hex>]    Create a category");
    println!("  login <email> <password>                Log in to the remote API");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
}

/// Value of `--<name> <value>` in `args`.
fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Positional arguments, with `--flag value` pairs removed.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_period(raw: Option<&str>, today: NaiveDate) -> Result<Period> {
    let Some(raw) = raw else {
        return Ok(Period::current(today));
    };
    let period = Period::parse(raw).with_context(|| format!("Expected YYYY-MM, got {raw:?}"))?;
    Ok(Period::new(period.month, period.year)?)
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    Decimal::from_str(&cleaned).with_context(|| format!("Invalid amount: {raw}"))
}

/// Match by id first, then by name ignoring case.
fn resolve_category<'a>(categories: &'a [Category], needle: &str) -> Result<&'a Category> {
    Category::find_by_id(categories, needle)
        .or_else(|| Category::find_by_name(categories, needle))
        .with_context(|| {
            let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
            format!("Category '{needle}' not found. Available: {}", names.join(", "))
        })
}

fn print_budgets(budgets: &[BudgetWithProgress], symbol: &str) {
    println!(
        "{:<4} {:<20} {:>12} {:>12} {:>12} {:>7}",
        "ID", "Category", "Budget", "Spent", "Remaining", "Used"
    );
    println!("{}", "─".repeat(90));
    for b in budgets {
        println!(
            "{:<4} {:<20} {:>12} {:>12} {:>12} {:>7} {} {}",
            b.id(),
            truncate(b.budget.category_name().unwrap_or("Uncategorized"), 20),
            format_money(b.budget.amount, symbol),
            format_money(b.spent, symbol),
            format_money(b.remaining, symbol),
            format_percentage(b.percentage_used),
            progress_bar(b.display_percentage(), 20),
            b.status(),
        );
    }
}

/// Refresh the current month so alerts surface after a change.
fn show_alerts(api: &dyn FinanceApi, today: NaiveDate) -> Result<()> {
    let mut board = BudgetBoard::new(Period::current(today));
    board.refresh(api, today, Instant::now(), &mut ConsoleSink)?;
    Ok(())
}

fn cli_budgets(args: &[String], api: &mut dyn FinanceApi, config: &Config, today: NaiveDate) -> Result<()> {
    let period = parse_period(positional(args).first().copied(), today)?;
    let mut board = BudgetBoard::new(period);
    let refresh = board.refresh(api, today, Instant::now(), &mut ConsoleSink)?;

    println!("Budgets: {} {}", month_name(period.month), period.year);
    if refresh.budgets.is_empty() {
        println!("No budgets set");
        return Ok(());
    }
    print_budgets(&refresh.budgets, &config.currency_symbol);
    Ok(())
}

fn cli_set_budget(args: &[String], api: &mut dyn FinanceApi, config: &Config, today: NaiveDate) -> Result<()> {
    let pos = positional(args);
    let [category, amount, ..] = pos.as_slice() else {
        anyhow::bail!("Usage: budgetpulse set-budget <category> <amount> [--month YYYY-MM]");
    };
    let period = parse_period(flag(args, "--month"), today)?;
    let amount = parse_amount(amount)?;
    let categories = api.categories()?;
    let category = resolve_category(&categories, category)?;

    // One budget per category and month: replace the ceiling if it exists.
    let existing = api.budgets(&BudgetFilters {
        category_id: Some(category.id.clone()),
        ..BudgetFilters::for_period(period)
    })?;
    let mut board = BudgetBoard::new(period);
    let budget = match existing.first() {
        Some(current) => board.update_budget(
            api,
            current.id(),
            &UpdateBudget {
                amount: Some(amount),
                ..UpdateBudget::default()
            },
        )?,
        None => board.create_budget(api, &CreateBudget::new(category.id.clone(), amount, period))?,
    };

    println!(
        "Budget for {} in {period}: {}",
        category.name,
        format_money(budget.amount, &config.currency_symbol)
    );
    show_alerts(api, today)
}

fn cli_delete_budget(args: &[String], api: &mut dyn FinanceApi, today: NaiveDate) -> Result<()> {
    let Some(id) = positional(args).first().copied() else {
        anyhow::bail!("Usage: budgetpulse delete-budget <id>");
    };
    let mut board = BudgetBoard::new(Period::current(today));
    board.delete_budget(api, id)?;
    println!("Deleted budget {id}");
    Ok(())
}

fn cli_add(args: &[String], api: &mut dyn FinanceApi, config: &Config, today: NaiveDate) -> Result<()> {
    let pos = positional(args);
    let [kind, amount, category, description @ ..] = pos.as_slice() else {
        anyhow::bail!(
            "Usage: budgetpulse add <income|expense> <amount> <category> <description> [--date YYYY-MM-DD]"
        );
    };
    let tx_type = TransactionType::parse(kind)
        .with_context(|| format!("Expected income or expense, got {kind:?}"))?;
    let amount = parse_amount(amount)?;
    let date = match flag(args, "--date") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Expected YYYY-MM-DD, got {raw:?}"))?,
        None => today,
    };
    let categories = api.categories()?;
    let category = resolve_category(&categories, category)?;

    let mut board = BudgetBoard::new(Period::of(date));
    let txn = board.create_transaction(
        api,
        &CreateTransaction {
            amount,
            description: description.join(" "),
            tx_type,
            date,
            category_id: category.id.clone(),
        },
    )?;
    println!(
        "Added {} {} on {} ({})",
        txn.tx_type.as_str().to_lowercase(),
        format_money(txn.amount, &config.currency_symbol),
        txn.date,
        category.name
    );
    show_alerts(api, today)
}

fn cli_transactions(args: &[String], api: &mut dyn FinanceApi, config: &Config, today: NaiveDate) -> Result<()> {
    let period = parse_period(positional(args).first().copied(), today)?;
    let txns = api.transactions(&TransactionFilters::for_period(period))?;
    if txns.is_empty() {
        println!("No transactions for {period}");
        return Ok(());
    }
    let categories = api.categories()?;

    println!(
        "{:<6} {:<10} {:<30} {:<18} {:>12}",
        "ID", "Date", "Description", "Category", "Amount"
    );
    println!("{}", "─".repeat(80));
    for t in &txns {
        let category = t
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .or_else(|| Category::find_by_id(&categories, &t.category_id).map(|c| c.name.as_str()))
            .unwrap_or("Uncategorized");
        println!(
            "{:<6} {:<10} {:<30} {:<18} {:>12}",
            t.id,
            t.date,
            truncate(&t.description, 30),
            truncate(category, 18),
            format_money(t.signed_amount(), &config.currency_symbol),
        );
    }
    Ok(())
}

fn cli_summary(args: &[String], api: &mut dyn FinanceApi, config: &Config, today: NaiveDate) -> Result<()> {
    let period = parse_period(positional(args).first().copied(), today)?;
    let filters = TransactionFilters::for_period(period);
    let stats = api.dashboard_stats(&filters)?;
    let by_category = api.category_stats(&filters)?;
    let symbol = config.currency_symbol.as_str();

    println!("BudgetPulse: {} {}", month_name(period.month), period.year);
    println!("{}", "─".repeat(40));
    println!("  Income:     {}", format_money(stats.total_income, symbol));
    println!("  Expenses:   {}", format_money(stats.total_expenses, symbol));
    println!("  Balance:    {}", format_money(stats.balance, symbol));
    println!("  Total Txns: {}", stats.transaction_count);

    let spending: Vec<_> = by_category
        .iter()
        .filter(|c| c.total_expenses > Decimal::ZERO)
        .collect();
    if !spending.is_empty() {
        println!();
        println!("Spending by Category:");
        for c in spending {
            println!(
                "  {:<24} {}",
                truncate(&c.category_name, 24),
                format_money(c.total_expenses, symbol)
            );
        }
    }
    Ok(())
}

fn cli_categories(api: &mut dyn FinanceApi) -> Result<()> {
    let categories = api.categories()?;
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    println!("{:<6} {:<24} Color", "ID", "Name");
    println!("{}", "─".repeat(40));
    for c in &categories {
        println!("{:<6} {:<24} {}", c.id, truncate(&c.name, 24), c.color);
    }
    Ok(())
}

fn cli_add_category(args: &[String], api: &mut dyn FinanceApi) -> Result<()> {
    let name = positional(args).join(" ");
    if name.trim().is_empty() {
        anyhow::bail!("Usage: budgetpulse add-category <name> [--color #hex]");
    }
    let color = flag(args, "--color").unwrap_or("#6B7280").to_string();
    let category = api.create_category(&CreateCategory { name, color })?;
    println!("Created category {} ({})", category.name, category.id);
    Ok(())
}

fn cli_login(args: &[String], api: &mut dyn FinanceApi) -> Result<()> {
    let pos = positional(args);
    let [email, password] = pos.as_slice() else {
        anyhow::bail!("Usage: budgetpulse login <email> <password>");
    };
    let resp = api.login(&LoginRequest::new(*email, *password))?;
    println!("Logged in as {} <{}>", resp.user.name, resp.user.email);
    println!("export {ENV_TOKEN}={}", resp.access_token);
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
