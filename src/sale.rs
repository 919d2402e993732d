//! 代币销售账本：定价、折扣、售罄截断、推荐奖励与可提取余额

use cosmwasm_std::{Addr, Binary, DepsMut, Env, Event, MessageInfo, Response, Uint128};

use crate::access::{must_have_role, must_not_paused, validate_address};
use crate::auth::{verify_buy, BuyParams};
use crate::error::ContractError;
use crate::state::{Config, Role, SaleState, SALE, TOKEN_BALANCES, USDT_BALANCES};
use crate::usdt::{ensure_can_pull, ensure_custody, floor_to_native, to_native, transfer_from_msg, transfer_msg, ONE};

/// 百分比以 ×10 的整数表示（一位小数），200 = 20.0%
pub const PERCENT_DENOMINATOR: u128 = 1000;
pub const MAX_DISCOUNT_PERCENT: u32 = 200;
pub const MAX_BUY_FOR_DISCOUNT_PERCENT: u32 = 100;
pub const MAX_REFERRAL_REWARD_PERCENT: u32 = 100;

/// 一次购买的报价结果（18 位精度）
#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub price_per_token: Uint128,
    pub token_amount: Uint128,
    pub spent_usdt: Uint128,
    pub clipped: bool,
}

/// 折后单价：price − price × discount / 1000
pub fn price_per_token(price: Uint128, discount_percent: u32) -> Result<Uint128, ContractError> {
    let discount = price.checked_multiply_ratio(discount_percent, PERCENT_DENOMINATOR)?;
    Ok(price.checked_sub(discount)?)
}

/// 计算可购买数量：金额先按稳定币最小单位向下取整；超过剩余额度时截断为剩余额度，并按截断后的数量重新计价
pub fn quote(sale: &SaleState, amount_usdt: Uint128, discount_percent: u32) -> Result<Quote, ContractError> {
    if sale.is_sold_out() {
        return Err(ContractError::SoldOut);
    }
    let price_per_token = price_per_token(sale.token_price_usdt, discount_percent)?;
    // only whole micro-USDT can be collected
    let amount_usdt = floor_to_native(amount_usdt)?;
    let requested = amount_usdt.checked_multiply_ratio(ONE, price_per_token)?;
    let remaining = sale.remaining();

    let (token_amount, spent_usdt, clipped) = if requested > remaining {
        (remaining, remaining.checked_multiply_ratio(price_per_token, ONE)?, true)
    } else {
        (requested, amount_usdt, false)
    };

    // nothing would be collected
    if token_amount.is_zero() || to_native(spent_usdt).is_zero() {
        return Err(ContractError::ZeroValueProvided);
    }
    Ok(Quote { price_per_token, token_amount, spent_usdt, clipped })
}

/// 推荐奖励：spent × percent / 1000，按稳定币最小单位向下取整
pub fn referral_reward(spent_usdt: Uint128, referral_reward_percent: u32) -> Result<Uint128, ContractError> {
    floor_to_native(spent_usdt.checked_multiply_ratio(referral_reward_percent, PERCENT_DENOMINATOR)?)
}

/// 用户购买：需要可信签名者对购买条款的授权（授权可重复使用）
#[allow(clippy::too_many_arguments)]
pub fn exec_buy(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    to: String,
    amount_usdt: Uint128,
    discount_percent: u32,
    referral: Option<String>,
    referral_reward_percent: u32,
    signature: Binary,
) -> Result<Response, ContractError> {
    let cfg = must_not_paused(deps.storage)?;
    if amount_usdt.is_zero() {
        return Err(ContractError::ZeroValueProvided);
    }
    if discount_percent > MAX_DISCOUNT_PERCENT {
        return Err(ContractError::DiscountPercentIsTooBig { value: discount_percent, max: MAX_DISCOUNT_PERCENT });
    }
    if referral_reward_percent > MAX_REFERRAL_REWARD_PERCENT {
        return Err(ContractError::ReferralRewardPercentIsTooBig {
            value: referral_reward_percent,
            max: MAX_REFERRAL_REWARD_PERCENT,
        });
    }

    let to = validate_address(deps.as_ref(), &to)?;
    let referral = match referral.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => Some(validate_address(deps.as_ref(), r)?),
        _ => None,
    };

    let params = BuyParams {
        to: to.as_str(),
        amount_usdt,
        discount_percent,
        referral_wallet: referral.as_ref().map(Addr::as_str).unwrap_or_default(),
        referral_reward_percent,
        sender: info.sender.as_str(),
    };
    verify_buy(deps.as_ref(), &env, &cfg, &params, signature.as_slice())?;

    let sale = SALE.load(deps.storage)?;
    let quote = quote(&sale, amount_usdt, discount_percent)?;
    settle_purchase(
        deps,
        &env,
        &cfg,
        sale,
        &info.sender,
        to,
        quote,
        discount_percent,
        referral.map(|r| (r, referral_reward_percent)),
    )
}

/// 仅 ADMIN：代他人购买，无需授权，折扣上限 10.0%，资金来自管理员自己的额度
pub fn exec_buy_for(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    to: String,
    amount_usdt: Uint128,
    discount_percent: u32,
) -> Result<Response, ContractError> {
    let cfg = must_not_paused(deps.storage)?;
    must_have_role(deps.storage, &info.sender, Role::Admin)?;
    let to = validate_address(deps.as_ref(), &to)?;
    if amount_usdt.is_zero() {
        return Err(ContractError::ZeroValueProvided);
    }
    if discount_percent > MAX_BUY_FOR_DISCOUNT_PERCENT {
        return Err(ContractError::DiscountPercentIsTooBig {
            value: discount_percent,
            max: MAX_BUY_FOR_DISCOUNT_PERCENT,
        });
    }

    let sale = SALE.load(deps.storage)?;
    let quote = quote(&sale, amount_usdt, discount_percent)?;
    settle_purchase(deps, &env, &cfg, sale, &info.sender, to, quote, discount_percent, None)
}

/// 拉取稳定币、记入推荐奖励、增加代币余额并累计已售数量
#[allow(clippy::too_many_arguments)]
fn settle_purchase(
    deps: DepsMut,
    env: &Env,
    cfg: &Config,
    mut sale: SaleState,
    payer: &Addr,
    to: Addr,
    quote: Quote,
    discount_percent: u32,
    referral: Option<(Addr, u32)>,
) -> Result<Response, ContractError> {
    let charged = to_native(quote.spent_usdt);
    ensure_can_pull(&deps.querier, &cfg.usdt_contract, payer, &env.contract.address, charged)?;

    let reward = match &referral {
        Some((_, percent)) => referral_reward(quote.spent_usdt, *percent)?,
        None => Uint128::zero(),
    };
    let reward_native = to_native(reward);
    let treasury_native = charged.checked_sub(reward_native)?;

    let new_balance = TOKEN_BALANCES
        .may_load(deps.storage, &to)?
        .unwrap_or_default()
        .checked_add(quote.token_amount)?;
    sale.total_sold_tokens = sale.total_sold_tokens.checked_add(quote.token_amount)?;
    let referral_balance = match &referral {
        Some((r, _)) => Some(USDT_BALANCES.may_load(deps.storage, r)?.unwrap_or_default().checked_add(reward)?),
        None => None,
    };

    let mut msgs = vec![];
    if !treasury_native.is_zero() {
        msgs.push(transfer_from_msg(&cfg.usdt_contract, payer, &cfg.treasury, treasury_native)?);
    }
    if !reward_native.is_zero() {
        msgs.push(transfer_from_msg(&cfg.usdt_contract, payer, &env.contract.address, reward_native)?);
    }

    TOKEN_BALANCES.save(deps.storage, &to, &new_balance)?;
    SALE.save(deps.storage, &sale)?;

    let mut events = vec![Event::new("buy")
        .add_attribute("buyer", to.as_str())
        .add_attribute("spent_usdt", quote.spent_usdt)
        .add_attribute("token_amount", quote.token_amount)
        .add_attribute("discount_percent", discount_percent.to_string())];

    if let (Some((referral, _)), Some(balance)) = (referral, referral_balance) {
        USDT_BALANCES.save(deps.storage, &referral, &balance)?;
        events.push(
            Event::new("referral_reward")
                .add_attribute("buyer", to.as_str())
                .add_attribute("referral", referral)
                .add_attribute("reward_usdt", reward)
                .add_attribute("spent_usdt", quote.spent_usdt),
        );
    }

    Ok(Response::new()
        .add_messages(msgs)
        .add_events(events)
        .add_attribute("action", "buy")
        .add_attribute("payer", payer.as_str())
        .add_attribute("clipped", quote.clipped.to_string()))
}

/// 提取推荐奖励到指定地址
pub fn exec_withdraw_usdt(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    to: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let cfg = must_not_paused(deps.storage)?;
    if amount.is_zero() {
        return Err(ContractError::ZeroValueProvided);
    }
    let to = validate_address(deps.as_ref(), &to)?;
    let balance = USDT_BALANCES.may_load(deps.storage, &info.sender)?.unwrap_or_default();
    if amount > balance {
        return Err(ContractError::NotEnoughUsdtOnBalance { required: amount, balance });
    }
    // 只扣除可以实际转出的部分，不足 1 micro-USDT 的零头留在余额中
    let native = to_native(amount);
    if native.is_zero() {
        return Err(ContractError::ZeroValueProvided);
    }
    let debited = floor_to_native(amount)?;
    ensure_custody(&deps.querier, &cfg.usdt_contract, &env.contract.address, native)?;

    USDT_BALANCES.save(deps.storage, &info.sender, &balance.checked_sub(debited)?)?;

    Ok(Response::new()
        .add_message(transfer_msg(&cfg.usdt_contract, &to, native)?)
        .add_attribute("action", "withdraw_usdt")
        .add_event(
            Event::new("withdraw_usdt")
                .add_attribute("account", info.sender)
                .add_attribute("to", to)
                .add_attribute("amount", debited),
        ))
}

/// 仅 ADMIN：更新代币价格（18 位精度）
pub fn exec_set_token_price(deps: DepsMut, info: MessageInfo, price: Uint128) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Admin)?;
    if price.is_zero() {
        return Err(ContractError::ZeroValueProvided);
    }
    let mut sale = SALE.load(deps.storage)?;
    sale.token_price_usdt = price;
    SALE.save(deps.storage, &sale)?;
    Ok(Response::new()
        .add_attribute("action", "set_token_price_usdt")
        .add_event(Event::new("token_price_usdt_update").add_attribute("price", price)))
}
