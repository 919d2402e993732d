//! 转盘账本：按日限量购买次数，凭一次性授权领取奖励

use cosmwasm_std::{Addr, Binary, DepsMut, Env, Event, MessageInfo, Response, Storage, Uint128};

use crate::access::{must_have_role, must_not_paused, validate_address};
use crate::auth::{verify_and_consume_claim, ClaimParams};
use crate::error::ContractError;
use crate::state::{DailySpins, RewardClass, Role, DAILY_SPINS, REWARD_BALANCES, SPINNER};
use crate::usdt::{ensure_can_pull, ensure_custody, to_native, transfer_from_msg, transfer_msg, whole_to_native};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// 领取结果：稳定币转出（原生精度），或记入后的新余额
enum Payout {
    Transfer(Uint128),
    Credit(Uint128),
}

/// 当前区块所在的日序号
pub fn day_index(env: &Env) -> u64 {
    env.block.time.seconds() / SECONDS_PER_DAY
}

pub fn exec_buy_spins(deps: DepsMut, env: Env, info: MessageInfo, count: u32) -> Result<Response, ContractError> {
    let cfg = must_not_paused(deps.storage)?;
    if count == 0 {
        return Err(ContractError::ZeroValueProvided);
    }
    let spinner = SPINNER.load(deps.storage)?;
    let required = to_native(spinner.spin_price_usdt.checked_mul(Uint128::from(count))?);
    ensure_can_pull(&deps.querier, &cfg.usdt_contract, &info.sender, &env.contract.address, required)?;

    let today = day_index(&env);
    let used = DAILY_SPINS.may_load(deps.storage, &info.sender)?.unwrap_or_default().used_on(today);
    if u64::from(used) + u64::from(count) > u64::from(spinner.max_spins_per_day) {
        return Err(ContractError::PurchaseLimitExceeded {
            requested: count,
            used,
            max: spinner.max_spins_per_day,
        });
    }

    DAILY_SPINS.save(deps.storage, &info.sender, &DailySpins { day_index: today, count: used + count })?;

    let mut res = Response::new();
    if !required.is_zero() {
        res = res.add_message(transfer_from_msg(&cfg.usdt_contract, &info.sender, &cfg.treasury, required)?);
    }
    Ok(res.add_attribute("action", "buy_spins").add_event(
        Event::new("buy_spins")
            .add_attribute("account", info.sender)
            .add_attribute("spin_price_usdt", spinner.spin_price_usdt)
            .add_attribute("count", count.to_string()),
    ))
}

/// 领取奖励：授权一经使用即失效
/// 稳定币类别从合约托管中转出 amount 个整币，其余类别记入余额
#[allow(clippy::too_many_arguments)]
pub fn exec_claim(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    to: String,
    token_id: u64,
    amount: Uint128,
    nonce: u64,
    signature: Binary,
) -> Result<Response, ContractError> {
    let cfg = must_not_paused(deps.storage)?;
    if amount.is_zero() {
        return Err(ContractError::ZeroOrNegativeValueProvided);
    }
    let class = RewardClass::from_id(token_id).ok_or(ContractError::InvalidTokenId { token_id })?;
    let to = validate_address(deps.as_ref(), &to)?;

    let payout = match class {
        RewardClass::StableAsset => {
            let native = whole_to_native(amount)?;
            ensure_custody(&deps.querier, &cfg.usdt_contract, &env.contract.address, native)?;
            Payout::Transfer(native)
        }
        _ => Payout::Credit(reward_balance(deps.storage, &to, class)?.checked_add(amount)?),
    };

    let params = ClaimParams { to: to.as_str(), token_id, amount, nonce, sender: info.sender.as_str() };
    verify_and_consume_claim(deps.branch(), &env, &cfg, &params, signature.as_slice())?;

    let mut res = Response::new();
    match payout {
        Payout::Transfer(native) => res = res.add_message(transfer_msg(&cfg.usdt_contract, &to, native)?),
        Payout::Credit(balance) => REWARD_BALANCES.save(deps.storage, (&to, class.id()), &balance)?,
    }

    Ok(res.add_attribute("action", "claim").add_event(
        Event::new("claim_reward")
            .add_attribute("to", to)
            .add_attribute("token_id", token_id.to_string())
            .add_attribute("amount", amount),
    ))
}

/// 仅 MINTER：直接记入非稳定币类别的奖励
pub fn exec_mint_reward(
    deps: DepsMut,
    info: MessageInfo,
    to: String,
    token_id: u64,
    amount: Uint128,
) -> Result<Response, ContractError> {
    must_not_paused(deps.storage)?;
    must_have_role(deps.storage, &info.sender, Role::Minter)?;
    if amount.is_zero() {
        return Err(ContractError::ZeroOrNegativeValueProvided);
    }
    let class = match RewardClass::from_id(token_id) {
        Some(RewardClass::StableAsset) | None => return Err(ContractError::InvalidTokenId { token_id }),
        Some(class) => class,
    };
    let to = validate_address(deps.as_ref(), &to)?;
    let balance = reward_balance(deps.storage, &to, class)?.checked_add(amount)?;
    REWARD_BALANCES.save(deps.storage, (&to, class.id()), &balance)?;

    Ok(Response::new().add_attribute("action", "mint_reward").add_event(
        Event::new("mint_reward")
            .add_attribute("minter", info.sender)
            .add_attribute("to", to)
            .add_attribute("token_id", token_id.to_string())
            .add_attribute("amount", amount),
    ))
}

fn reward_balance(storage: &dyn Storage, to: &Addr, class: RewardClass) -> Result<Uint128, ContractError> {
    Ok(REWARD_BALANCES.may_load(storage, (to, class.id()))?.unwrap_or_default())
}

/// 仅 ADMIN：更新单次价格（18 位精度）
pub fn exec_set_spin_price(deps: DepsMut, info: MessageInfo, price: Uint128) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Admin)?;
    if price.is_zero() {
        return Err(ContractError::ZeroValueProvided);
    }
    let mut spinner = SPINNER.load(deps.storage)?;
    spinner.spin_price_usdt = price;
    SPINNER.save(deps.storage, &spinner)?;
    Ok(Response::new()
        .add_attribute("action", "set_spin_price_usdt")
        .add_event(Event::new("spin_price_usdt_update").add_attribute("price", price)))
}

/// 仅 ADMIN：更新每日上限
pub fn exec_set_max_spins_per_day(deps: DepsMut, info: MessageInfo, max: u32) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Admin)?;
    if max == 0 {
        return Err(ContractError::ZeroValueProvided);
    }
    let mut spinner = SPINNER.load(deps.storage)?;
    spinner.max_spins_per_day = max;
    SPINNER.save(deps.storage, &spinner)?;
    Ok(Response::new()
        .add_attribute("action", "set_max_spins_per_day")
        .add_event(Event::new("max_spins_per_day_update").add_attribute("max", max.to_string())))
}
