use chainwatch_utils::config::{Config, ResponsePolicy};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "chainwatch", bin_name = "chainwatch", version)]
pub struct Cli {
    /// JSON-RPC endpoint used to query native balances
    #[arg(long, env = "CHAINWATCH_RPC_URL", global = true)]
    pub rpc_url: Option<String>,

    /// Base URL of the CoinGecko compatible price history API
    #[arg(long, env = "CHAINWATCH_PRICE_API_URL", global = true)]
    pub price_api_url: Option<String>,

    /// Which history response wins when requests overlap
    #[arg(long, value_enum, global = true)]
    pub response_policy: Option<PolicyArg>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track addresses and print their native balances
    #[command(alias = "w")]
    Watch {
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Print the USD price history of an asset between two dates (YYYY-MM-DD)
    #[command(alias = "hist")]
    History {
        /// Asset id, e.g. ethereum
        token: String,
        start: String,
        end: String,
    },

    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    LatestIssued,
    LastResolved,
}

impl From<PolicyArg> for ResponsePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::LatestIssued => ResponsePolicy::LatestIssued,
            PolicyArg::LastResolved => ResponsePolicy::LastResolved,
        }
    }
}

impl Cli {
    /// Command line values take precedence over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = Some(rpc_url.clone());
        }
        if let Some(price_api_url) = &self.price_api_url {
            config.price_api_url = price_api_url.clone();
        }
        if let Some(policy) = self.response_policy {
            config.response_policy = policy.into();
        }
    }
}
