//! 稳定币（CW20）协作方：额度/余额查询、转账消息与精度换算
//!
//! 内部记账统一为 18 位精度，只有在构造 CW20 消息或比对 CW20 额度/余额时
//! 才换算为稳定币的 6 位原生精度（向下取整）。

use cosmwasm_std::{to_json_binary, Addr, CosmosMsg, QuerierWrapper, StdResult, Uint128, WasmMsg};
use cw20::{AllowanceResponse, BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg};

use crate::error::ContractError;

pub const USDT_DECIMALS: u32 = 6;

/// 10^18：18 位精度中的 1 个单位
pub const ONE: u128 = 1_000_000_000_000_000_000;
const NATIVE_SCALE: u128 = 1_000_000_000_000;

/// 18 位 → 6 位（向下取整）
pub fn to_native(amount: Uint128) -> Uint128 {
    amount / Uint128::new(NATIVE_SCALE)
}

/// 6 位 → 18 位
pub fn from_native(amount: Uint128) -> Result<Uint128, ContractError> {
    Ok(amount.checked_mul(Uint128::new(NATIVE_SCALE))?)
}

/// 去掉低于 1 micro-USDT 的部分，使记账金额可以被完整转出
pub fn floor_to_native(amount: Uint128) -> Result<Uint128, ContractError> {
    from_native(to_native(amount))
}

/// 整数个稳定币 → 原生精度
pub fn whole_to_native(amount: Uint128) -> Result<Uint128, ContractError> {
    Ok(amount.checked_mul(Uint128::new(10u128.pow(USDT_DECIMALS)))?)
}

pub fn query_allowance(querier: &QuerierWrapper, usdt: &Addr, owner: &Addr, spender: &Addr) -> StdResult<Uint128> {
    let res: AllowanceResponse = querier.query_wasm_smart(
        usdt,
        &Cw20QueryMsg::Allowance { owner: owner.to_string(), spender: spender.to_string() },
    )?;
    Ok(res.allowance)
}

pub fn query_balance(querier: &QuerierWrapper, usdt: &Addr, address: &Addr) -> StdResult<Uint128> {
    let res: BalanceResponse = querier.query_wasm_smart(usdt, &Cw20QueryMsg::Balance { address: address.to_string() })?;
    Ok(res.balance)
}

/// 在发出 TransferFrom 之前确认付款方的额度与余额（原生精度）
pub fn ensure_can_pull(
    querier: &QuerierWrapper,
    usdt: &Addr,
    owner: &Addr,
    spender: &Addr,
    required: Uint128,
) -> Result<(), ContractError> {
    let allowance = query_allowance(querier, usdt, owner, spender)?;
    if allowance < required {
        return Err(ContractError::NotEnoughUsdtAllowance { required, allowance });
    }
    let balance = query_balance(querier, usdt, owner)?;
    if balance < required {
        return Err(ContractError::NotEnoughUsdtOnBalance { required, balance });
    }
    Ok(())
}

/// 确认本合约托管的稳定币足以转出
pub fn ensure_custody(querier: &QuerierWrapper, usdt: &Addr, contract: &Addr, required: Uint128) -> Result<(), ContractError> {
    let balance = query_balance(querier, usdt, contract)?;
    if balance < required {
        return Err(ContractError::NotEnoughUsdtOnBalance { required, balance });
    }
    Ok(())
}

pub fn transfer_from_msg(usdt: &Addr, owner: &Addr, recipient: &Addr, amount: Uint128) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: usdt.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::TransferFrom {
            owner: owner.to_string(),
            recipient: recipient.to_string(),
            amount,
        })?,
        funds: vec![],
    }
    .into())
}

pub fn transfer_msg(usdt: &Addr, recipient: &Addr, amount: Uint128) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: usdt.to_string(),
        msg: to_json_binary(&Cw20ExecuteMsg::Transfer { recipient: recipient.to_string(), amount })?,
        funds: vec![],
    }
    .into())
}
