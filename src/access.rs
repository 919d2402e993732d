//! 权限与暂停：每个地址持有一组角色位，所有变更入口显式检查

use cosmwasm_std::{Addr, Deps, DepsMut, Event, MessageInfo, Response, Storage};

use crate::error::ContractError;
use crate::state::{Capabilities, Config, Role, CONFIG, ROLES};

impl Capabilities {
    pub fn all() -> Self {
        Role::ALL.iter().fold(Capabilities::default(), |c, r| c.with(*r))
    }

    pub fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn with(self, role: Role) -> Self {
        Capabilities(self.0 | role.bit())
    }

    pub fn without(self, role: Role) -> Self {
        Capabilities(self.0 & !role.bit())
    }
}

pub fn has_role(storage: &dyn Storage, account: &Addr, role: Role) -> Result<bool, ContractError> {
    let caps = ROLES.may_load(storage, account)?.unwrap_or_default();
    Ok(caps.contains(role))
}

/// 断言调用者持有指定角色
pub fn must_have_role(storage: &dyn Storage, account: &Addr, role: Role) -> Result<(), ContractError> {
    if !has_role(storage, account, role)? {
        return Err(ContractError::AccessControlUnauthorizedAccount {
            account: account.to_string(),
            role: role.as_str().to_string(),
        });
    }
    Ok(())
}

/// 断言合约未暂停，返回最新配置
pub fn must_not_paused(storage: &dyn Storage) -> Result<Config, ContractError> {
    let cfg = CONFIG.load(storage)?;
    if cfg.paused {
        return Err(ContractError::EnforcedPause);
    }
    Ok(cfg)
}

pub fn exec_pause(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Pauser)?;
    let mut cfg = must_not_paused(deps.storage)?;
    cfg.paused = true;
    CONFIG.save(deps.storage, &cfg)?;
    Ok(Response::new()
        .add_attribute("action", "pause")
        .add_event(Event::new("paused").add_attribute("account", info.sender)))
}

pub fn exec_unpause(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Pauser)?;
    let mut cfg = CONFIG.load(deps.storage)?;
    if !cfg.paused {
        return Err(ContractError::ExpectedPause);
    }
    cfg.paused = false;
    CONFIG.save(deps.storage, &cfg)?;
    Ok(Response::new()
        .add_attribute("action", "unpause")
        .add_event(Event::new("unpaused").add_attribute("account", info.sender)))
}

/// 仅 ADMIN：授予角色（重复授予不报错）
pub fn exec_grant_role(deps: DepsMut, info: MessageInfo, role: Role, account: String) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Admin)?;
    let account = validate_address(deps.as_ref(), &account)?;
    let caps = ROLES.may_load(deps.storage, &account)?.unwrap_or_default();
    ROLES.save(deps.storage, &account, &caps.with(role))?;
    Ok(Response::new().add_attribute("action", "grant_role").add_event(
        Event::new("role_granted")
            .add_attribute("role", role.as_str())
            .add_attribute("account", account)
            .add_attribute("sender", info.sender),
    ))
}

/// 仅 ADMIN：撤销角色
pub fn exec_revoke_role(deps: DepsMut, info: MessageInfo, role: Role, account: String) -> Result<Response, ContractError> {
    must_have_role(deps.storage, &info.sender, Role::Admin)?;
    let account = validate_address(deps.as_ref(), &account)?;
    let caps = ROLES.may_load(deps.storage, &account)?.unwrap_or_default().without(role);
    if caps == Capabilities::default() {
        ROLES.remove(deps.storage, &account);
    } else {
        ROLES.save(deps.storage, &account, &caps)?;
    }
    Ok(Response::new().add_attribute("action", "revoke_role").add_event(
        Event::new("role_revoked")
            .add_attribute("role", role.as_str())
            .add_attribute("account", account)
            .add_attribute("sender", info.sender),
    ))
}

/// 校验地址；空地址视为零地址
pub fn validate_address(deps: Deps, address: &str) -> Result<Addr, ContractError> {
    if address.trim().is_empty() {
        return Err(ContractError::ZeroAddressProvided);
    }
    Ok(deps.api.addr_validate(address)?)
}
