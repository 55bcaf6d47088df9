use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about = "A token-authenticated blog API")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run pending migrations and serve the API (the default).
	Serve,
	/// Wait until the database accepts connections.
	WaitForDb {
		/// Delay between attempts, in milliseconds.
		#[arg(long, default_value_t = 1000)]
		interval_ms: u64,
		/// Give up after this many failed attempts.
		#[arg(long, default_value_t = 30)]
		max_attempts: u32,
	},
	/// Create a staff superuser.
	CreateSuperuser {
		#[arg(long, env = "SUPERUSER_EMAIL")]
		email: String,
		#[arg(long, env = "SUPERUSER_PASSWORD", hide_env_values = true)]
		password: String,
	},
}

impl Cli {
	pub fn command(self) -> Command {
		self.command.unwrap_or(Command::Serve)
	}
}

#[cfg(test)]
mod test {
	use clap::Parser;

	use super::{Cli, Command};

	#[test]
	fn test_serve_is_default() {
		let cli = Cli::try_parse_from(["blog-api"]).unwrap();

		assert!(matches!(cli.command(), Command::Serve));
	}

	#[test]
	fn test_wait_for_db_arguments() {
		let cli = Cli::try_parse_from(["blog-api", "wait-for-db", "--interval-ms", "50"]).unwrap();

		assert!(matches!(
			cli.command(),
			Command::WaitForDb {
				interval_ms: 50,
				max_attempts: 30
			}
		));
	}

	#[test]
	fn test_create_superuser_arguments() {
		let cli = Cli::try_parse_from([
			"blog-api",
			"create-superuser",
			"--email",
			"admin@example.com",
			"--password",
			"hunter2hunter",
		])
		.unwrap();

		let Command::CreateSuperuser { email, password } = cli.command() else {
			panic!("expected create-superuser");
		};

		assert_eq!(email, "admin@example.com");
		assert_eq!(password, "hunter2hunter");
	}
}
