use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Uint128};
use crate::state::Role;

/// 实例化参数：管理员、稳定币合约、国库、可信签名者与初始价格/上限
#[cw_serde]
pub struct InstantiateMsg {
    pub admin: String,
    pub usdt_contract: String,
    pub treasury: String,
    /// 十六进制 20 字节地址，可带 0x 前缀
    pub api_signer: String,
    pub total_tokens_for_sale: Uint128,
    pub token_price_usdt: Uint128,
    pub spin_price_usdt: Uint128,
    pub max_spins_per_day: u32,
}

/// 执行消息入口（Execute）：销售、转盘领奖、权限与暂停管理
#[cw_serde]
pub enum ExecuteMsg {
    // token sale
    Buy {
        to: String,
        amount_usdt: Uint128,
        discount_percent: u32,
        referral: Option<String>,
        referral_reward_percent: u32,
        signature: Binary,
    },
    BuyFor { to: String, amount_usdt: Uint128, discount_percent: u32 },
    WithdrawUsdt { to: String, amount: Uint128 },
    SetTokenPriceUsdt { price: Uint128 },
    // spinner
    BuySpins { count: u32 },
    Claim {
        to: String,
        token_id: u64,
        amount: Uint128,
        nonce: u64,
        signature: Binary,
    },
    MintReward { to: String, token_id: u64, amount: Uint128 },
    SetSpinPriceUsdt { price: Uint128 },
    SetMaxSpinsPerDay { max: u32 },
    // admin controls
    SetApiSigner { signer: String },
    Pause {},
    Unpause {},
    GrantRole { role: Role, account: String },
    RevokeRole { role: Role, account: String },
}

/// 查询消息入口（Query）：暂停状态下同样可用
#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},
    #[returns(SaleStateResponse)]
    SaleState {},
    #[returns(SpinnerStateResponse)]
    SpinnerState {},
    #[returns(BalanceResponse)]
    TokenBalance { address: String },
    #[returns(BalanceResponse)]
    UsdtBalance { address: String },
    #[returns(BalanceResponse)]
    RewardBalance { address: String, token_id: u64 },
    #[returns(SpinsTodayResponse)]
    SpinsToday { address: String },
    #[returns(HasRoleResponse)]
    HasRole { role: Role, address: String },
    #[returns(SignatureUsedResponse)]
    IsSignatureUsed { signature: Binary },
}

#[cw_serde]
pub struct ConfigResponse {
    pub usdt_contract: String,
    pub treasury: String,
    /// 0x 前缀的十六进制地址
    pub api_signer: String,
    pub paused: bool,
}

#[cw_serde]
pub struct SaleStateResponse {
    pub token_price_usdt: Uint128,
    pub total_tokens_for_sale: Uint128,
    pub total_sold_tokens: Uint128,
    pub sold_out: bool,
}

#[cw_serde]
pub struct SpinnerStateResponse {
    pub spin_price_usdt: Uint128,
    pub max_spins_per_day: u32,
}

#[cw_serde]
pub struct BalanceResponse { pub balance: Uint128 }

/// 当天已购买次数与剩余次数
#[cw_serde]
pub struct SpinsTodayResponse { pub day_index: u64, pub used: u32, pub remaining: u32 }

#[cw_serde]
pub struct HasRoleResponse { pub has_role: bool }

#[cw_serde]
pub struct SignatureUsedResponse { pub used: bool }

/// 迁移参数：空置接口，为未来升级预留
#[cw_serde]
pub struct MigrateMsg {}
