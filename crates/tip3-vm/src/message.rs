//! Messages, method bodies and the FIFO queue.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::VecDeque;
use std::fmt;

use crate::address::Address;
use crate::code::{Code, CodeHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque user payload attached to token operations and forwarded to callbacks.
#[derive(Clone, PartialEq, Eq, Default, Hash)]
pub struct Payload(Vec<u8>);

impl Payload {
    pub fn empty() -> Self {
        Payload(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Payload(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload(bytes)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload(text.as_bytes().to_vec())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({})", hex::encode(&self.0))
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map(Payload).map_err(serde::de::Error::custom)
    }
}

/// One entry of a `transferOwnership` callback list. Entries are delivered in
/// list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub dest: Address,
    pub value: u128,
    pub payload: Payload,
}

/// Value returned by a responsible method to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "answer", rename_all = "camelCase")]
pub enum Answer {
    WalletDeployed { wallet: Address },
    BurnPaused { paused: bool },
    MintDisabled { disabled: bool },
    BurnByRootDisabled { disabled: bool },
}

/// Init data for a wallet deployed by message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInit {
    pub root: Address,
    pub owner: Address,
    /// Code the address is derived from.
    pub address_code: CodeHash,
    /// Present for upgradeable wallets.
    pub platform_code: Option<Code>,
    pub version: u32,
}

/// Code and data travelling with a deploy message. Only wallets are deployed
/// by contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInit {
    pub code: Code,
    pub data: WalletInit,
}

impl StateInit {
    pub fn address(&self) -> Address {
        Address::wallet(&self.data.address_code, &self.data.root, &self.data.owner)
    }
}

/// A method call carried by an internal message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Method {
    /// Body-less value transfer.
    Empty,
    /// Constructor call of a deploy message.
    Constructor,

    // token root
    Mint {
        amount: u128,
        recipient: Address,
        deploy_wallet_value: u128,
        remaining_gas_to: Address,
        notify: bool,
        payload: Payload,
    },
    BurnTokens {
        amount: u128,
        wallet_owner: Address,
        remaining_gas_to: Address,
        callback_to: Address,
        payload: Payload,
    },
    AcceptBurn {
        amount: u128,
        wallet_owner: Address,
        remaining_gas_to: Address,
        callback_to: Address,
        payload: Payload,
    },
    SetBurnPaused {
        paused: bool,
    },
    DisableMint,
    DisableBurnByRoot,
    DeployWallet {
        wallet_owner: Address,
        deploy_wallet_value: u128,
    },
    SendSurplusGas {
        to: Address,
    },
    TransferOwnership {
        new_owner: Address,
        remaining_gas_to: Address,
        callbacks: Vec<Callback>,
    },
    Upgrade {
        code: Code,
    },
    SetWalletCode {
        code: Code,
    },
    RequestUpgradeWallet {
        current_version: u32,
        wallet_owner: Address,
        remaining_gas_to: Address,
    },

    // token wallet
    Transfer {
        amount: u128,
        recipient: Address,
        deploy_wallet_value: u128,
        remaining_gas_to: Address,
        notify: bool,
        payload: Payload,
    },
    TransferToWallet {
        amount: u128,
        recipient_wallet: Address,
        remaining_gas_to: Address,
        notify: bool,
        payload: Payload,
    },
    AcceptTransfer {
        amount: u128,
        sender: Address,
        remaining_gas_to: Address,
        notify: bool,
        payload: Payload,
    },
    AcceptMint {
        amount: u128,
        remaining_gas_to: Address,
        notify: bool,
        payload: Payload,
    },
    Burn {
        amount: u128,
        remaining_gas_to: Address,
        callback_to: Address,
        payload: Payload,
    },
    BurnByRoot {
        amount: u128,
        remaining_gas_to: Address,
        callback_to: Address,
        payload: Payload,
    },
    Destroy {
        remaining_gas_to: Address,
    },
    UpgradeWallet {
        remaining_gas_to: Address,
    },
    AcceptUpgrade {
        code: Code,
        version: u32,
        remaining_gas_to: Address,
    },

    // callbacks
    OnAcceptTokensMint {
        token_root: Address,
        amount: u128,
        remaining_gas_to: Address,
        payload: Payload,
    },
    OnAcceptTokensTransfer {
        token_root: Address,
        amount: u128,
        sender: Address,
        sender_wallet: Address,
        remaining_gas_to: Address,
        payload: Payload,
    },
    OnAcceptTokensBurn {
        amount: u128,
        wallet_owner: Address,
        wallet: Address,
        remaining_gas_to: Address,
        payload: Payload,
    },
    OnBounceTokensTransfer {
        token_root: Address,
        amount: u128,
        reverted_from: Address,
    },
    OnBounceTokensBurn {
        token_root: Address,
        amount: u128,
    },
    OnTransferTokenRootOwnership {
        old_owner: Address,
        new_owner: Address,
        remaining_gas_to: Address,
        payload: Payload,
    },
    Answer(Answer),
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Empty => "<empty>",
            Method::Constructor => "constructor",
            Method::Mint { .. } => "mint",
            Method::BurnTokens { .. } => "burnTokens",
            Method::AcceptBurn { .. } => "acceptBurn",
            Method::SetBurnPaused { .. } => "setBurnPaused",
            Method::DisableMint => "disableMint",
            Method::DisableBurnByRoot => "disableBurnByRoot",
            Method::DeployWallet { .. } => "deployWallet",
            Method::SendSurplusGas { .. } => "sendSurplusGas",
            Method::TransferOwnership { .. } => "transferOwnership",
            Method::Upgrade { .. } => "upgrade",
            Method::SetWalletCode { .. } => "setWalletCode",
            Method::RequestUpgradeWallet { .. } => "requestUpgradeWallet",
            Method::Transfer { .. } => "transfer",
            Method::TransferToWallet { .. } => "transferToWallet",
            Method::AcceptTransfer { .. } => "acceptTransfer",
            Method::AcceptMint { .. } => "acceptMint",
            Method::Burn { .. } => "burn",
            Method::BurnByRoot { .. } => "burnByRoot",
            Method::Destroy { .. } => "destroy",
            Method::UpgradeWallet { .. } => "upgrade",
            Method::AcceptUpgrade { .. } => "acceptUpgrade",
            Method::OnAcceptTokensMint { .. } => "onAcceptTokensMint",
            Method::OnAcceptTokensTransfer { .. } => "onAcceptTokensTransfer",
            Method::OnAcceptTokensBurn { .. } => "onAcceptTokensBurn",
            Method::OnBounceTokensTransfer { .. } => "onBounceTokensTransfer",
            Method::OnBounceTokensBurn { .. } => "onBounceTokensBurn",
            Method::OnTransferTokenRootOwnership { .. } => "onTransferTokenRootOwnership",
            Method::Answer(_) => "<answer>",
        }
    }
}

/// External (unsigned) calls, executed synchronously outside the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum ExternalCall {
    SendTransaction {
        dest: Address,
        value: u128,
        bounce: bool,
        body: Method,
    },
    SetRoot {
        root: Address,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub src: Address,
    pub dst: Address,
    pub value: u128,
    pub body: Method,
    pub bounce: bool,
    /// Set on messages synthesized by the dispatcher after a failed delivery.
    pub bounced: bool,
    pub state_init: Option<StateInit>,
}

/// Pending messages in causal order.
#[derive(Debug, Default, Clone)]
pub struct MessageQueue {
    pending: VecDeque<Message>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.pending.push_back(message);
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.pending.pop_front()
    }

    pub fn peek(&self) -> Option<&Message> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.pending.iter()
    }
}
