//! wormfare_ledger
//!
//! A CosmWasm contract holding two ledgers settled in a CW20 stable asset:
//! - Token sale: fixed price, signed discounts and referral rewards,
//!   clipping at the sale cap, withdrawable referral balances
//! - Spinner: daily-limited spin purchases and single-use signed reward claims
//! - Role bits (admin/pauser/minter) and a global pause switch
//!
//! CosmWasm 销售与奖励合约，功能包括：
//! - 代币销售：固定价格、经签名授权的折扣与推荐奖励、售罄截断、推荐奖励提取
//! - 转盘：按日限量购买次数，凭一次性签名领取奖励
//! - 角色位（管理员/暂停者/铸造者）与全局暂停开关
pub mod access;
pub mod auth;
pub mod contract;
pub mod error;
pub mod msg;
pub mod sale;
pub mod spinner;
pub mod state;
pub mod usdt;

pub use crate::error::ContractError;
pub use crate::contract::{instantiate, execute, query, migrate};
