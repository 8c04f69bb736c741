use std::{collections::HashMap, fmt::Display};

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use serde_with::{formats::PreferMany, serde_as, skip_serializing_none, OneOrMany};

use crate::{
    alloy::StringExt,
    disk_storage::{DiskStorageInterface, FileFormat},
};

#[skip_serializing_none]
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Network {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    pub name_aliases: Vec<String>,
    pub chain_id: u32,
    pub rpc_url: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_testnet: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Token>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Token {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub contract_address: Address,
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (chain_id: {})", self.name, self.chain_id)
    }
}

impl Network {
    pub fn from_name(network_name: &str) -> crate::Result<Network> {
        NetworkStore::load_and_update()?
            .get_by_name(network_name)
            .ok_or(crate::Error::NetworkNotFound(network_name.to_string()))
    }

    pub fn get_rpc(&self) -> crate::Result<String> {
        self.rpc_url
            .clone()
            .ok_or_else(|| crate::Error::RpcUrlNotFound {
                network: self.name.clone(),
                chain_id: self.chain_id,
            })
    }

    /// Finds a token either by contract address or by symbol.
    ///
    /// An address which is not in the token list is accepted as is and
    /// yields `None`, the caller then has to find out its decimals.
    pub fn resolve_token(&self, token: &str) -> crate::Result<(Address, Option<Token>)> {
        if let Ok(address) = token.parse_as_address() {
            let listed = self
                .tokens
                .iter()
                .find(|t| t.contract_address == address)
                .cloned();
            return Ok((address, listed));
        }

        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(token.trim()))
            .map(|t| (t.contract_address, Some(t.clone())))
            .ok_or_else(|| crate::Error::TokenNotFound {
                token: token.to_string(),
                network: self.name.clone(),
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct NetworkStore {
    pub networks: Vec<Network>,
}

impl DiskStorageInterface for NetworkStore {
    const FILE_NAME: &'static str = "networks";
    const FORMAT: FileFormat = FileFormat::YAML;
}

impl NetworkStore {
    /// Merges the built-in networks with the ones on disk, user entries
    /// taking precedence, and writes the result back.
    pub fn load_and_update() -> crate::Result<Self> {
        let store = Self::merge(default_networks(), NetworkStore::load()?.networks);
        store.save()?;
        Ok(store)
    }

    fn merge(defaults: Vec<Network>, user: Vec<Network>) -> Self {
        let mut networks = HashMap::<u32, Network>::new();

        for entry in defaults.into_iter().chain(user) {
            let merged = match networks.remove(&entry.chain_id) {
                Some(existing) => {
                    let mut name_aliases = entry.name_aliases.clone();
                    for alias in existing.name_aliases {
                        if !name_aliases.contains(&alias) {
                            name_aliases.push(alias);
                        }
                    }

                    let mut tokens = HashMap::<Address, Token>::new();
                    for token in existing.tokens.into_iter().chain(entry.tokens) {
                        tokens.insert(token.contract_address, token);
                    }
                    let mut tokens = tokens.into_values().collect::<Vec<_>>();
                    tokens.sort_by(|a, b| a.contract_address.cmp(&b.contract_address));

                    Network {
                        name: entry.name,
                        name_aliases,
                        chain_id: entry.chain_id,
                        rpc_url: entry.rpc_url.or(existing.rpc_url),
                        is_testnet: entry.is_testnet,
                        tokens,
                    }
                }
                None => entry,
            };

            networks.insert(merged.chain_id, merged);
        }

        // Sort by chain ID and keep testnets at the bottom
        let mut networks = networks.into_values().collect::<Vec<_>>();
        networks.sort_by(|a, b| {
            a.is_testnet
                .cmp(&b.is_testnet)
                .then(a.chain_id.cmp(&b.chain_id))
        });

        NetworkStore { networks }
    }

    pub fn get_by_name(&self, network_name: &str) -> Option<Network> {
        self.networks
            .iter()
            .find(|n| {
                n.name.eq_ignore_ascii_case(network_name)
                    || n.name_aliases
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(network_name))
            })
            .cloned()
    }

    pub fn get_by_chain_id(&self, chain_id: u32) -> Option<Network> {
        self.networks
            .iter()
            .find(|n| n.chain_id == chain_id)
            .cloned()
    }
}

fn token(name: &str, symbol: &str, decimals: u8, contract_address: Address) -> Token {
    Token {
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
        contract_address,
    }
}

fn default_networks() -> Vec<Network> {
    vec![
        Network {
            name: "Mainnet".to_string(),
            name_aliases: vec!["ethereum".to_string(), "eth-mainnet".to_string()],
            chain_id: 1,
            rpc_url: Some("https://ethereum-rpc.publicnode.com".to_string()),
            is_testnet: false,
            tokens: vec![
                token(
                    "Wrapped Ether",
                    "WETH",
                    18,
                    address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
                ),
                token(
                    "MakerDAO's DAI",
                    "DAI",
                    18,
                    address!("0x6b175474e89094c44da98b954eedeac495271d0f"),
                ),
                token(
                    "Coinbase USD Coin",
                    "USDC",
                    6,
                    address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                ),
                token(
                    "Tether USD",
                    "USDT",
                    6,
                    address!("0xdAC17F958D2ee523a2206206994597C13D831ec7"),
                ),
            ],
        },
        Network {
            name: "Arbitrum".to_string(),
            name_aliases: vec!["arb-mainnet".to_string()],
            chain_id: 42161,
            rpc_url: Some("https://arbitrum-one-rpc.publicnode.com".to_string()),
            is_testnet: false,
            tokens: vec![
                token(
                    "Wrapped Ether",
                    "WETH",
                    18,
                    address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
                ),
                token(
                    "Coinbase USD Coin",
                    "USDC",
                    6,
                    address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831"),
                ),
                token(
                    "Tether USD",
                    "USDT",
                    6,
                    address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9"),
                ),
            ],
        },
        Network {
            name: "Base".to_string(),
            name_aliases: vec!["base-mainnet".to_string()],
            chain_id: 8453,
            rpc_url: Some("https://base-rpc.publicnode.com".to_string()),
            is_testnet: false,
            tokens: vec![token(
                "Coinbase USD Coin",
                "USDC",
                6,
                address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            )],
        },
        Network {
            name: "Sepolia".to_string(),
            name_aliases: vec!["eth-sepolia".to_string()],
            chain_id: 11155111,
            rpc_url: Some("https://ethereum-sepolia-rpc.publicnode.com".to_string()),
            is_testnet: true,
            tokens: vec![],
        },
    ]
}
