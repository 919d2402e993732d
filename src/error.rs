use cosmwasm_std::{CheckedMultiplyRatioError, OverflowError, StdError, Uint128};
use thiserror::Error;

/// 销售 / 转盘合约错误定义
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    MultiplyRatio(#[from] CheckedMultiplyRatioError),

    // validation
    #[error("Zero value provided")]
    ZeroValueProvided,

    #[error("Zero or negative value provided")]
    ZeroOrNegativeValueProvided,

    #[error("Zero address provided")]
    ZeroAddressProvided,

    #[error("Invalid token id: {token_id}")]
    InvalidTokenId { token_id: u64 },

    #[error("Discount percent is too big: {value} exceeds maximum {max}")]
    DiscountPercentIsTooBig { value: u32, max: u32 },

    #[error("Referral reward percent is too big: {value} exceeds maximum {max}")]
    ReferralRewardPercentIsTooBig { value: u32, max: u32 },

    // authorization
    #[error("Invalid signature length: {length}")]
    InvalidSignatureLength { length: usize },

    #[error("Invalid signature")]
    InvalidSignature,

    // resources
    #[error("Not enough USDT allowance: required {required}, allowance {allowance}")]
    NotEnoughUsdtAllowance { required: Uint128, allowance: Uint128 },

    #[error("Not enough USDT on balance: required {required}, balance {balance}")]
    NotEnoughUsdtOnBalance { required: Uint128, balance: Uint128 },

    #[error("All tokens have been sold out")]
    SoldOut,

    #[error("Purchase limit exceeded: {used} used + {requested} requested exceeds maximum {max} per day")]
    PurchaseLimitExceeded { requested: u32, used: u32, max: u32 },

    // state / access
    #[error("Enforced pause")]
    EnforcedPause,

    #[error("Expected pause")]
    ExpectedPause,

    #[error("Invalid initialization")]
    InvalidInitialization,

    #[error("Account {account} is missing role {role}")]
    AccessControlUnauthorizedAccount { account: String, role: String },
}
