//! Call builders for node and wallet APIs.
//!
//! Wallet methods take positional parameters, node (appbase) methods take a
//! parameter object.

use super::{CommunicationError, RpcClient};
use serde_json::{json, Value};

/// Node API calls the harness relies on
#[derive(Debug, Clone, Copy)]
pub struct NodeApi<'a> {
    client: &'a RpcClient,
}

impl<'a> NodeApi<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        Self { client }
    }

    pub fn get_dynamic_global_properties(&self) -> Result<Value, CommunicationError> {
        self.client
            .call("database_api.get_dynamic_global_properties", json!({}))
    }

    pub fn get_config(&self) -> Result<Value, CommunicationError> {
        self.client.call("database_api.get_config", json!({}))
    }

    /// P2P information, including this node's `node_id`
    pub fn get_info(&self) -> Result<Value, CommunicationError> {
        self.client.call("network_node_api.get_info", json!({}))
    }

    pub fn get_connected_peers(&self) -> Result<Value, CommunicationError> {
        self.client
            .call("network_node_api.get_connected_peers", json!({}))
    }

    /// Restrict p2p connections to the given node ids
    pub fn set_allowed_peers(&self, allowed_peers: &[String]) -> Result<Value, CommunicationError> {
        self.client.call(
            "network_node_api.set_allowed_peers",
            json!({ "allowed_peers": allowed_peers }),
        )
    }
}

/// `cli_wallet` JSON-RPC calls
#[derive(Debug, Clone, Copy)]
pub struct WalletApi<'a> {
    client: &'a RpcClient,
}

impl<'a> WalletApi<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        Self { client }
    }

    fn send(&self, method: &str, params: Value) -> Result<Value, CommunicationError> {
        self.client.call(method, params)
    }

    pub fn info(&self) -> Result<Value, CommunicationError> {
        self.send("info", json!([]))
    }

    pub fn set_password(&self, password: &str) -> Result<Value, CommunicationError> {
        self.send("set_password", json!([password]))
    }

    pub fn unlock(&self, password: &str) -> Result<Value, CommunicationError> {
        self.send("unlock", json!([password]))
    }

    pub fn import_key(&self, key: &str) -> Result<Value, CommunicationError> {
        self.send("import_key", json!([key]))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_account_with_keys(
        &self,
        creator: &str,
        new_account_name: &str,
        json_meta: &str,
        owner: &str,
        active: &str,
        posting: &str,
        memo: &str,
        broadcast: bool,
    ) -> Result<Value, CommunicationError> {
        self.send(
            "create_account_with_keys",
            json!([creator, new_account_name, json_meta, owner, active, posting, memo, broadcast]),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_funded_account_with_keys(
        &self,
        creator: &str,
        new_account_name: &str,
        initial_amount: &str,
        memo: &str,
        json_meta: &str,
        owner_key: &str,
        active_key: &str,
        posting_key: &str,
        memo_key: &str,
        broadcast: bool,
    ) -> Result<Value, CommunicationError> {
        self.send(
            "create_funded_account_with_keys",
            json!([
                creator,
                new_account_name,
                initial_amount,
                memo,
                json_meta,
                owner_key,
                active_key,
                posting_key,
                memo_key,
                broadcast
            ]),
        )
    }

    pub fn claim_account_creation(&self, creator: &str, fee: &str, broadcast: bool) -> Result<Value, CommunicationError> {
        self.send("claim_account_creation", json!([creator, fee, broadcast]))
    }

    pub fn transfer_to_vesting(
        &self,
        sender: &str,
        receiver: &str,
        amount: &str,
        broadcast: bool,
    ) -> Result<Value, CommunicationError> {
        self.send("transfer_to_vesting", json!([sender, receiver, amount, broadcast]))
    }

    pub fn list_accounts(&self, lowerbound: &str, limit: u32) -> Result<Value, CommunicationError> {
        self.send("list_accounts", json!([lowerbound, limit]))
    }

    pub fn update_witness(
        &self,
        witness_name: &str,
        url: &str,
        block_signing_key: &str,
        props: Value,
        broadcast: bool,
    ) -> Result<Value, CommunicationError> {
        self.send(
            "update_witness",
            json!([witness_name, url, block_signing_key, props, broadcast]),
        )
    }

    pub fn vote_for_witness(
        &self,
        account_to_vote_with: &str,
        witness_to_vote_for: &str,
        approve: bool,
        broadcast: bool,
    ) -> Result<Value, CommunicationError> {
        self.send(
            "vote_for_witness",
            json!([account_to_vote_with, witness_to_vote_for, approve, broadcast]),
        )
    }
}
