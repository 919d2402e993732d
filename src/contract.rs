#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{attr, to_json_binary, Binary, Deps, DepsMut, Env, Event, MessageInfo, Response, StdError, StdResult, Uint128};
use cw2::{get_contract_version, set_contract_version};

use crate::access::{exec_grant_role, exec_pause, exec_revoke_role, exec_unpause, has_role, must_have_role, validate_address};
use crate::auth::{format_signer, parse_signer, signature_key};
use crate::error::ContractError;
use crate::msg::{
    BalanceResponse, ConfigResponse, ExecuteMsg, HasRoleResponse, InstantiateMsg, MigrateMsg, QueryMsg, SaleStateResponse,
    SignatureUsedResponse, SpinnerStateResponse, SpinsTodayResponse,
};
use crate::sale::{exec_buy, exec_buy_for, exec_set_token_price, exec_withdraw_usdt};
use crate::spinner::{day_index, exec_buy_spins, exec_claim, exec_mint_reward, exec_set_max_spins_per_day, exec_set_spin_price};
use crate::state::{
    Capabilities, Config, RewardClass, Role, SaleState, SpinnerState, CONFIG, DAILY_SPINS, REWARD_BALANCES, ROLES, SALE,
    SPINNER, TOKEN_BALANCES, USDT_BALANCES, USED_SIGNATURES,
};

/// 合约名称与版本（用于迁移安全校验）
const CONTRACT_NAME: &str = "crates.io:wormfare_ledger";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 初始化合约：记录稳定币、国库与可信签名者，管理员获得全部角色
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(deps: DepsMut, _env: Env, info: MessageInfo, msg: InstantiateMsg) -> Result<Response, ContractError> {
    if CONFIG.may_load(deps.storage)?.is_some() {
        return Err(ContractError::InvalidInitialization);
    }

    let admin = validate_address(deps.as_ref(), &msg.admin)?;
    let usdt_contract = validate_address(deps.as_ref(), &msg.usdt_contract)?;
    let treasury = validate_address(deps.as_ref(), &msg.treasury)?;
    let api_signer = parse_signer(&msg.api_signer)?;
    if msg.total_tokens_for_sale.is_zero()
        || msg.token_price_usdt.is_zero()
        || msg.spin_price_usdt.is_zero()
        || msg.max_spins_per_day == 0
    {
        return Err(ContractError::ZeroValueProvided);
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config { usdt_contract, treasury, api_signer, paused: false };
    CONFIG.save(deps.storage, &config)?;
    SALE.save(
        deps.storage,
        &SaleState {
            token_price_usdt: msg.token_price_usdt,
            total_tokens_for_sale: msg.total_tokens_for_sale,
            total_sold_tokens: Uint128::zero(),
        },
    )?;
    SPINNER.save(
        deps.storage,
        &SpinnerState { spin_price_usdt: msg.spin_price_usdt, max_spins_per_day: msg.max_spins_per_day },
    )?;
    ROLES.save(deps.storage, &admin, &Capabilities::all())?;

    Ok(Response::new().add_attributes(vec![
        attr("action", "instantiate"),
        attr("sender", info.sender),
        attr("admin", admin),
        attr("usdt_contract", config.usdt_contract),
        attr("treasury", config.treasury),
        attr("api_signer", format_signer(config.api_signer.as_slice())),
        attr("total_tokens_for_sale", msg.total_tokens_for_sale),
        attr("token_price_usdt", msg.token_price_usdt),
    ]))
}

/// 执行入口：根据消息分派到具体执行函数
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(deps: DepsMut, env: Env, info: MessageInfo, msg: ExecuteMsg) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Buy { to, amount_usdt, discount_percent, referral, referral_reward_percent, signature } => {
            exec_buy(deps, env, info, to, amount_usdt, discount_percent, referral, referral_reward_percent, signature)
        }
        ExecuteMsg::BuyFor { to, amount_usdt, discount_percent } => exec_buy_for(deps, env, info, to, amount_usdt, discount_percent),
        ExecuteMsg::WithdrawUsdt { to, amount } => exec_withdraw_usdt(deps, env, info, to, amount),
        ExecuteMsg::SetTokenPriceUsdt { price } => exec_set_token_price(deps, info, price),
        ExecuteMsg::BuySpins { count } => exec_buy_spins(deps, env, info, count),
        ExecuteMsg::Claim { to, token_id, amount, nonce, signature } => {
            exec_claim(deps, env, info, to, token_id, amount, nonce, signature)
        }
        ExecuteMsg::MintReward { to, token_id, amount } => exec_mint_reward(deps, info, to, token_id, amount),
        ExecuteMsg::SetSpinPriceUsdt { price } => exec_set_spin_price(deps, info, price),
        ExecuteMsg::SetMaxSpinsPerDay { max } => exec_set_max_spins_per_day(deps, info, max),
        // admin controls
        ExecuteMsg::SetApiSigner { signer } => exec_set_api_signer(deps, info, signer),
        ExecuteMsg::Pause {} => exec_pause(deps, info),
        ExecuteMsg::Unpause {} => exec_unpause(deps, info),
        ExecuteMsg::GrantRole { role, account } => exec_grant_role(deps, info, role, account),
        ExecuteMsg::RevokeRole { role, account } => exec_revoke_role(deps, info, role, account),
    }
}

/// 仅 ADMIN：更换可信签名者（销售与转盘共用）
fn exec_set_api_signer(deps: DepsMut, info: MessageInfo, signer: String) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Admin)?;
    let api_signer = parse_signer(&signer)?;
    let mut cfg = CONFIG.load(deps.storage)?;
    cfg.api_signer = api_signer;
    CONFIG.save(deps.storage, &cfg)?;
    Ok(Response::new()
        .add_attribute("action", "set_api_signer")
        .add_event(Event::new("api_signer_update").add_attribute("signer", format_signer(cfg.api_signer.as_slice()))))
}

/// 查询入口：根据查询消息返回对应的序列化结果
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::SaleState {} => to_json_binary(&query_sale_state(deps)?),
        QueryMsg::SpinnerState {} => to_json_binary(&query_spinner_state(deps)?),
        QueryMsg::TokenBalance { address } => to_json_binary(&query_token_balance(deps, address)?),
        QueryMsg::UsdtBalance { address } => to_json_binary(&query_usdt_balance(deps, address)?),
        QueryMsg::RewardBalance { address, token_id } => to_json_binary(&query_reward_balance(deps, address, token_id)?),
        QueryMsg::SpinsToday { address } => to_json_binary(&query_spins_today(deps, env, address)?),
        QueryMsg::HasRole { role, address } => to_json_binary(&query_has_role(deps, role, address)?),
        QueryMsg::IsSignatureUsed { signature } => to_json_binary(&query_signature_used(deps, signature)?),
    }
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let cfg = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        usdt_contract: cfg.usdt_contract.to_string(),
        treasury: cfg.treasury.to_string(),
        api_signer: format_signer(cfg.api_signer.as_slice()),
        paused: cfg.paused,
    })
}

fn query_sale_state(deps: Deps) -> StdResult<SaleStateResponse> {
    let sale = SALE.load(deps.storage)?;
    Ok(SaleStateResponse {
        token_price_usdt: sale.token_price_usdt,
        total_tokens_for_sale: sale.total_tokens_for_sale,
        total_sold_tokens: sale.total_sold_tokens,
        sold_out: sale.is_sold_out(),
    })
}

fn query_spinner_state(deps: Deps) -> StdResult<SpinnerStateResponse> {
    let spinner = SPINNER.load(deps.storage)?;
    Ok(SpinnerStateResponse { spin_price_usdt: spinner.spin_price_usdt, max_spins_per_day: spinner.max_spins_per_day })
}

/// 已购代币余额（18 位精度）
fn query_token_balance(deps: Deps, address: String) -> StdResult<BalanceResponse> {
    let addr = deps.api.addr_validate(&address)?;
    let balance = TOKEN_BALANCES.may_load(deps.storage, &addr)?.unwrap_or_default();
    Ok(BalanceResponse { balance })
}

/// 可提取的推荐奖励（18 位精度）
fn query_usdt_balance(deps: Deps, address: String) -> StdResult<BalanceResponse> {
    let addr = deps.api.addr_validate(&address)?;
    let balance = USDT_BALANCES.may_load(deps.storage, &addr)?.unwrap_or_default();
    Ok(BalanceResponse { balance })
}

fn query_reward_balance(deps: Deps, address: String, token_id: u64) -> StdResult<BalanceResponse> {
    let class = RewardClass::from_id(token_id)
        .ok_or_else(|| StdError::generic_err(format!("Invalid token id: {token_id}")))?;
    let addr = deps.api.addr_validate(&address)?;
    let balance = REWARD_BALANCES.may_load(deps.storage, (&addr, class.id()))?.unwrap_or_default();
    Ok(BalanceResponse { balance })
}

/// 当天（按区块时间）已购买与剩余的转盘次数
fn query_spins_today(deps: Deps, env: Env, address: String) -> StdResult<SpinsTodayResponse> {
    let addr = deps.api.addr_validate(&address)?;
    let today = day_index(&env);
    let used = DAILY_SPINS.may_load(deps.storage, &addr)?.unwrap_or_default().used_on(today);
    let max = SPINNER.load(deps.storage)?.max_spins_per_day;
    Ok(SpinsTodayResponse { day_index: today, used, remaining: max.saturating_sub(used) })
}

fn query_has_role(deps: Deps, role: Role, address: String) -> StdResult<HasRoleResponse> {
    let addr = deps.api.addr_validate(&address)?;
    let held = has_role(deps.storage, &addr, role).map_err(|e| StdError::generic_err(e.to_string()))?;
    Ok(HasRoleResponse { has_role: held })
}

fn query_signature_used(deps: Deps, signature: Binary) -> StdResult<SignatureUsedResponse> {
    let key = signature_key(signature.as_slice());
    Ok(SignatureUsedResponse { used: USED_SIGNATURES.has(deps.storage, key.as_slice()) })
}

/// 迁移：拒绝来自其他合约的代码，刷新版本号
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let previous = get_contract_version(deps.storage)?;
    if previous.contract != CONTRACT_NAME {
        return Err(StdError::generic_err(format!("Cannot migrate from contract {}", previous.contract)).into());
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", previous.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
