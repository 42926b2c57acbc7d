use crate::evaluate::{run_evaluate, EvaluateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_eligibility::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Eligibility Service",
    about = "Serve or run loan eligibility evaluations from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a single loan request and print the decision as JSON
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["loan-eligibility-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_evaluate_arguments() {
        let cli = Cli::try_parse_from([
            "loan-eligibility-api",
            "evaluate",
            "--salary",
            "2500",
            "--amount",
            "6000.50",
            "--term",
            "24",
            "--last-loan-date",
            "2025-01-31",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.salary, Decimal::from(2500));
                assert_eq!(args.amount, Decimal::new(600050, 2));
                assert_eq!(args.term, 24);
                assert_eq!(
                    args.last_loan_date,
                    NaiveDate::from_ymd_opt(2025, 1, 31)
                );
                assert!(!args.no_prior_loans);
            }
            other => panic!("expected evaluate command, got {other:?}"),
        }
    }

    #[test]
    fn last_loan_date_conflicts_with_no_prior_loans() {
        let outcome = Cli::try_parse_from([
            "loan-eligibility-api",
            "evaluate",
            "--salary",
            "2500",
            "--amount",
            "6000",
            "--term",
            "24",
            "--last-loan-date",
            "2025-01-31",
            "--no-prior-loans",
        ]);
        assert!(outcome.is_err());
    }
}
