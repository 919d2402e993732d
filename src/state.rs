use cosmwasm_std::{Addr, HexBinary, Uint128};
use cw_storage_plus::{Item, Map};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 全局配置（只存一份）：稳定币合约、国库地址、可信签名者地址与暂停标记
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Config {
    pub usdt_contract: Addr,
    pub treasury: Addr,
    /// 20 字节 secp256k1 地址（keccak256(pubkey)[12..]）
    pub api_signer: HexBinary,
    pub paused: bool,
}

/// 代币销售状态：价格与总量均为 18 位精度
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct SaleState {
    pub token_price_usdt: Uint128,
    pub total_tokens_for_sale: Uint128,
    pub total_sold_tokens: Uint128,
}

impl SaleState {
    /// 剩余可售数量
    pub fn remaining(&self) -> Uint128 {
        self.total_tokens_for_sale.saturating_sub(self.total_sold_tokens)
    }

    pub fn is_sold_out(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// 转盘状态：单次价格（18 位精度）与每日上限
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct SpinnerState {
    pub spin_price_usdt: Uint128,
    pub max_spins_per_day: u32,
}

/// 每日购买计数：day_index = 区块时间（秒） / 86400
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema, Default)]
pub struct DailySpins {
    pub day_index: u64,
    pub count: u32,
}

impl DailySpins {
    /// 跨天后计数视为清零
    pub fn used_on(&self, day_index: u64) -> u32 {
        if self.day_index == day_index { self.count } else { 0 }
    }
}

/// 权限位集合：ADMIN / PAUSER / MINTER
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema, Default)]
pub struct Capabilities(pub u8);

/// 角色
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Pauser,
    Minter,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Pauser, Role::Minter];

    pub fn bit(self) -> u8 {
        match self {
            Role::Admin => 0b001,
            Role::Pauser => 0b010,
            Role::Minter => 0b100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pauser => "pauser",
            Role::Minter => "minter",
        }
    }
}

/// 奖励类别（token_id）：0=WOFR 1=USDT 2=BOND 3=VOUCHER
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RewardClass {
    PrimaryToken,
    StableAsset,
    Bond,
    Voucher,
}

impl RewardClass {
    pub fn id(self) -> u8 {
        match self {
            RewardClass::PrimaryToken => 0,
            RewardClass::StableAsset => 1,
            RewardClass::Bond => 2,
            RewardClass::Voucher => 3,
        }
    }

    pub fn from_id(token_id: u64) -> Option<Self> {
        match token_id {
            0 => Some(RewardClass::PrimaryToken),
            1 => Some(RewardClass::StableAsset),
            2 => Some(RewardClass::Bond),
            3 => Some(RewardClass::Voucher),
            _ => None,
        }
    }
}

/// 单实例配置项
pub const CONFIG: Item<Config> = Item::new("config");
pub const SALE: Item<SaleState> = Item::new("sale");
pub const SPINNER: Item<SpinnerState> = Item::new("spinner");

/// 地址 → 权限位集合
pub const ROLES: Map<&Addr, Capabilities> = Map::new("roles");

/// 已购代币余额（18 位精度）
pub const TOKEN_BALANCES: Map<&Addr, Uint128> = Map::new("token_balances");
/// 可提取的推荐奖励（18 位精度）
pub const USDT_BALANCES: Map<&Addr, Uint128> = Map::new("usdt_balances");
/// （地址, 奖励类别）→ 余额
pub const REWARD_BALANCES: Map<(&Addr, u8), Uint128> = Map::new("reward_balances");
pub const DAILY_SPINS: Map<&Addr, DailySpins> = Map::new("daily_spins");
/// sha256(signature) → 已消费的领奖签名
pub const USED_SIGNATURES: Map<&[u8], bool> = Map::new("used_signatures");
