#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cosmwasm_std::{
    from_json,
    testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier, MockStorage},
    to_json_binary, Addr, Binary, ContractResult, CosmosMsg, Env, OwnedDeps, Response, SystemError, SystemResult, Uint128,
    WasmMsg, WasmQuery,
};
use cw20::{AllowanceResponse, BalanceResponse as Cw20BalanceResponse, Cw20ExecuteMsg, Cw20QueryMsg, Expiration};
use k256::ecdsa::{RecoveryId, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use wormfare_ledger::{
    auth::{address_from_pubkey, buy_digest, claim_digest, format_signer, BuyParams, ClaimParams, Domain, SALE_DOMAIN_NAME, SPINNER_DOMAIN_NAME},
    contract::{execute, instantiate, query},
    error::ContractError,
    msg::{
        BalanceResponse, ConfigResponse, ExecuteMsg, InstantiateMsg, QueryMsg, SaleStateResponse, SignatureUsedResponse,
        SpinsTodayResponse,
    },
};

pub type TestDeps = OwnedDeps<MockStorage, MockApi, MockQuerier>;

/// 测试常量（18 位精度）
pub const ONE: u128 = 1_000_000_000_000_000_000;
pub const TOKEN_PRICE: u128 = ONE / 2;
pub const TOTAL_TOKENS_FOR_SALE: u128 = 10_000 * ONE;
pub const SPIN_PRICE: u128 = ONE;
pub const MAX_SPINS_PER_DAY: u32 = 10;

pub const TOKEN_ID_WOFR: u64 = 0;
pub const TOKEN_ID_USDT: u64 = 1;
pub const TOKEN_ID_BOND: u64 = 2;
pub const TOKEN_ID_VOUCHER: u64 = 3;

/// 18 位精度金额
pub fn ether(n: u128) -> Uint128 {
    Uint128::new(n * ONE)
}

/// 稳定币原生精度（6 位）
pub fn tether(n: u128) -> Uint128 {
    Uint128::new(n * 1_000_000)
}

pub fn addr(name: &str) -> Addr {
    MockApi::default().addr_make(name)
}

/// 模拟 CW20 账本：余额与授权额度（原生精度）
#[derive(Default, Debug)]
pub struct UsdtBook {
    balances: HashMap<String, Uint128>,
    allowances: HashMap<(String, String), Uint128>,
}

impl UsdtBook {
    pub fn balance(&self, who: &str) -> Uint128 {
        self.balances.get(who).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: &str, spender: &str) -> Uint128 {
        self.allowances.get(&(owner.to_string(), spender.to_string())).copied().unwrap_or_default()
    }

    fn move_funds(&mut self, from: &str, to: &str, amount: Uint128) {
        let from_balance = self.balance(from);
        assert!(from_balance >= amount, "cw20: insufficient balance of {from}");
        self.balances.insert(from.to_string(), from_balance - amount);
        let to_balance = self.balance(to);
        self.balances.insert(to.to_string(), to_balance + amount);
    }
}

/// 测试套件：合约依赖、环境、稳定币账本与可信签名私钥
pub struct Suite {
    pub deps: TestDeps,
    pub env: Env,
    pub usdt: Addr,
    pub treasury: Addr,
    pub admin: Addr,
    pub book: Arc<Mutex<UsdtBook>>,
    pub signer: SigningKey,
}

pub fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_slice(&[seed; 32]).unwrap()
}

/// 私钥对应的 20 字节地址（0x 十六进制）
pub fn signer_address(key: &SigningKey) -> String {
    let point = k256::PublicKey::from(key.verifying_key()).to_encoded_point(false);
    format_signer(&address_from_pubkey(point.as_bytes()).unwrap())
}

/// 对摘要签名：65 字节 r|s|v，v = 27 + recid，s 为低位形式
pub fn sign_digest(key: &SigningKey, digest: &[u8; 32]) -> Binary {
    let (mut sig, mut recid) = key.sign_prehash_recoverable(digest).unwrap();
    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        recid = RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced());
    }
    let mut out = sig.to_bytes().to_vec();
    out.push(27 + recid.to_byte());
    Binary::from(out)
}

pub fn default_instantiate_msg(admin: &Addr, usdt: &Addr, treasury: &Addr, signer: &SigningKey) -> InstantiateMsg {
    InstantiateMsg {
        admin: admin.to_string(),
        usdt_contract: usdt.to_string(),
        treasury: treasury.to_string(),
        api_signer: signer_address(signer),
        total_tokens_for_sale: Uint128::new(TOTAL_TOKENS_FOR_SALE),
        token_price_usdt: Uint128::new(TOKEN_PRICE),
        spin_price_usdt: Uint128::new(SPIN_PRICE),
        max_spins_per_day: MAX_SPINS_PER_DAY,
    }
}

impl Suite {
    /// 创建测试环境（未初始化合约）
    pub fn new() -> Self {
        let mut deps = mock_dependencies();
        let usdt = addr("usdt");
        let book = Arc::new(Mutex::new(UsdtBook::default()));

        let handler_book = book.clone();
        let usdt_addr = usdt.to_string();
        deps.querier.update_wasm(move |query| match query {
            WasmQuery::Smart { contract_addr, msg } if *contract_addr == usdt_addr => {
                let book = handler_book.lock().unwrap();
                let res = match from_json::<Cw20QueryMsg>(msg).unwrap() {
                    Cw20QueryMsg::Allowance { owner, spender } => to_json_binary(&AllowanceResponse {
                        allowance: book.allowance(&owner, &spender),
                        expires: Expiration::Never {},
                    }),
                    Cw20QueryMsg::Balance { address } => {
                        to_json_binary(&Cw20BalanceResponse { balance: book.balance(&address) })
                    }
                    other => panic!("unexpected cw20 query {other:?}"),
                };
                SystemResult::Ok(ContractResult::Ok(res.unwrap()))
            }
            WasmQuery::Smart { contract_addr, .. } => {
                SystemResult::Err(SystemError::NoSuchContract { addr: contract_addr.clone() })
            }
            _ => SystemResult::Err(SystemError::Unknown {}),
        });

        Suite {
            deps,
            env: mock_env(),
            usdt,
            treasury: addr("treasury"),
            admin: addr("admin"),
            book,
            signer: signing_key(7),
        }
    }

    /// 创建并初始化合约
    pub fn setup() -> Self {
        let mut suite = Suite::new();
        suite.instantiate_default().unwrap();
        suite
    }

    pub fn instantiate_default(&mut self) -> Result<Response, ContractError> {
        let msg = default_instantiate_msg(&self.admin, &self.usdt, &self.treasury, &self.signer);
        self.instantiate(msg)
    }

    pub fn instantiate(&mut self, msg: InstantiateMsg) -> Result<Response, ContractError> {
        let info = message_info(&addr("deployer"), &[]);
        instantiate(self.deps.as_mut(), self.env.clone(), info, msg)
    }

    pub fn contract(&self) -> Addr {
        self.env.contract.address.clone()
    }

    /// 执行消息；成功时把 CW20 转账消息回放到模拟账本
    pub fn execute(&mut self, sender: &Addr, msg: ExecuteMsg) -> Result<Response, ContractError> {
        let info = message_info(sender, &[]);
        let res = execute(self.deps.as_mut(), self.env.clone(), info, msg)?;
        self.apply_cw20(&res);
        Ok(res)
    }

    fn apply_cw20(&self, res: &Response) {
        let contract = self.contract().to_string();
        let mut book = self.book.lock().unwrap();
        for sub in &res.messages {
            let CosmosMsg::Wasm(WasmMsg::Execute { contract_addr, msg, .. }) = &sub.msg else {
                continue;
            };
            assert_eq!(*contract_addr, self.usdt.to_string());
            match from_json::<Cw20ExecuteMsg>(msg).unwrap() {
                Cw20ExecuteMsg::TransferFrom { owner, recipient, amount } => {
                    let key = (owner.clone(), contract.clone());
                    let allowance = book.allowance(&owner, &contract);
                    assert!(allowance >= amount, "cw20: insufficient allowance of {owner}");
                    book.allowances.insert(key, allowance - amount);
                    book.move_funds(&owner, &recipient, amount);
                }
                Cw20ExecuteMsg::Transfer { recipient, amount } => book.move_funds(&contract, &recipient, amount),
                other => panic!("unexpected cw20 message {other:?}"),
            }
        }
    }

    /// 给地址铸造稳定币（原生精度）
    pub fn mint_usdt(&self, to: &Addr, amount: Uint128) {
        let mut book = self.book.lock().unwrap();
        let balance = book.balance(to.as_str());
        book.balances.insert(to.to_string(), balance + amount);
    }

    /// 授权本合约从 owner 拉取稳定币（原生精度）
    pub fn approve_usdt(&self, owner: &Addr, amount: Uint128) {
        let key = (owner.to_string(), self.contract().to_string());
        self.book.lock().unwrap().allowances.insert(key, amount);
    }

    /// 铸造并授权 amount
    pub fn fund(&self, owner: &Addr, amount: Uint128) {
        self.mint_usdt(owner, amount);
        self.approve_usdt(owner, amount);
    }

    pub fn usdt_balance_of(&self, who: &Addr) -> Uint128 {
        self.book.lock().unwrap().balance(who.as_str())
    }

    /// 可信签名者对购买条款的签名
    pub fn sign_buy(
        &self,
        sender: &Addr,
        to: &Addr,
        amount_usdt: Uint128,
        discount_percent: u32,
        referral: Option<&Addr>,
        referral_reward_percent: u32,
    ) -> Binary {
        self.sign_buy_with(&self.signer, sender, to, amount_usdt, discount_percent, referral, referral_reward_percent)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn sign_buy_with(
        &self,
        key: &SigningKey,
        sender: &Addr,
        to: &Addr,
        amount_usdt: Uint128,
        discount_percent: u32,
        referral: Option<&Addr>,
        referral_reward_percent: u32,
    ) -> Binary {
        let params = BuyParams {
            to: to.as_str(),
            amount_usdt,
            discount_percent,
            referral_wallet: referral.map(Addr::as_str).unwrap_or_default(),
            referral_reward_percent,
            sender: sender.as_str(),
        };
        sign_digest(key, &buy_digest(&Domain::for_contract(SALE_DOMAIN_NAME, &self.env), &params))
    }

    /// 签名并以 sender 身份购买（代币记给 sender 自己）
    pub fn buy(
        &mut self,
        sender: &Addr,
        amount_usdt: Uint128,
        discount_percent: u32,
        referral: Option<&Addr>,
        referral_reward_percent: u32,
    ) -> Result<Response, ContractError> {
        let signature = self.sign_buy(sender, sender, amount_usdt, discount_percent, referral, referral_reward_percent);
        let msg = ExecuteMsg::Buy {
            to: sender.to_string(),
            amount_usdt,
            discount_percent,
            referral: referral.map(Addr::to_string),
            referral_reward_percent,
            signature,
        };
        self.execute(sender, msg)
    }

    pub fn sign_claim(&self, sender: &Addr, to: &Addr, token_id: u64, amount: Uint128, nonce: u64) -> Binary {
        let params = ClaimParams { to: to.as_str(), token_id, amount, nonce, sender: sender.as_str() };
        sign_digest(&self.signer, &claim_digest(&Domain::for_contract(SPINNER_DOMAIN_NAME, &self.env), &params))
    }

    pub fn claim(&mut self, sender: &Addr, token_id: u64, amount: Uint128, nonce: u64) -> Result<Response, ContractError> {
        let signature = self.sign_claim(sender, sender, token_id, amount, nonce);
        let msg = ExecuteMsg::Claim { to: sender.to_string(), token_id, amount, nonce, signature };
        self.execute(sender, msg)
    }

    pub fn query<T: serde::de::DeserializeOwned>(&self, msg: QueryMsg) -> T {
        let res = query(self.deps.as_ref(), self.env.clone(), msg).unwrap();
        from_json(res).unwrap()
    }

    pub fn query_config(&self) -> ConfigResponse {
        self.query(QueryMsg::Config {})
    }

    pub fn query_sale_state(&self) -> SaleStateResponse {
        self.query(QueryMsg::SaleState {})
    }

    pub fn token_balance(&self, who: &Addr) -> Uint128 {
        self.query::<BalanceResponse>(QueryMsg::TokenBalance { address: who.to_string() }).balance
    }

    pub fn referral_balance(&self, who: &Addr) -> Uint128 {
        self.query::<BalanceResponse>(QueryMsg::UsdtBalance { address: who.to_string() }).balance
    }

    pub fn reward_balance(&self, who: &Addr, token_id: u64) -> Uint128 {
        self.query::<BalanceResponse>(QueryMsg::RewardBalance { address: who.to_string(), token_id }).balance
    }

    pub fn spins_today(&self, who: &Addr) -> SpinsTodayResponse {
        self.query(QueryMsg::SpinsToday { address: who.to_string() })
    }

    pub fn is_signature_used(&self, signature: &Binary) -> bool {
        self.query::<SignatureUsedResponse>(QueryMsg::IsSignatureUsed { signature: signature.clone() }).used
    }

    pub fn pause(&mut self) {
        let admin = self.admin.clone();
        self.execute(&admin, ExecuteMsg::Pause {}).unwrap();
    }
}

/// 查找事件属性
pub fn event_attr(res: &Response, event: &str, key: &str) -> Option<String> {
    res.events
        .iter()
        .find(|e| e.ty == event)
        .and_then(|e| e.attributes.iter().find(|a| a.key == key))
        .map(|a| a.value.clone())
}
