//! 链下授权校验
//!
//! 授权消息按 EIP-712 方式编码：domain = {name, version, chainId, verifyingContract}，
//! 字符串字段取 keccak256，整数字段为 32 字节大端。签名为 65 字节 r|s|v，
//! 通过 secp256k1 恢复公钥并比对可信签名者地址。
//!
//! 购买授权（BuyParams）只证明购买条款，可以重复使用；
//! 领奖授权（ClaimParams）一经使用即记录 sha256(signature)，之后永久拒绝。

use cosmwasm_std::{Api, Deps, DepsMut, Env, HexBinary, StdError, Uint128};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::error::ContractError;
use crate::state::{Config, USED_SIGNATURES};

pub const SALE_DOMAIN_NAME: &str = "Wormfare Token Sale";
pub const SPINNER_DOMAIN_NAME: &str = "Wormfare Spinner";
pub const DOMAIN_VERSION: &str = "1";
pub const SIGNATURE_LENGTH: usize = 65;

const DOMAIN_TYPE: &[u8] = b"EIP712Domain(string name,string version,string chainId,string verifyingContract)";
const BUY_TYPE: &[u8] = b"BuyParams(string to,uint256 amountUsdt,uint256 discountPercent,string referralWallet,uint256 referralRewardPercent,string sender)";
const CLAIM_TYPE: &[u8] = b"ClaimParams(string to,uint256 tokenId,uint256 amount,uint256 nonce,string sender)";

/// secp256k1 阶的一半，s 超过该值的签名是可塑形式
const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

#[derive(Clone, Debug, PartialEq)]
pub struct Domain<'a> {
    pub name: &'a str,
    pub chain_id: &'a str,
    pub verifying_contract: &'a str,
}

impl<'a> Domain<'a> {
    /// 以当前链与本合约地址绑定的 domain
    pub fn for_contract(name: &'a str, env: &'a Env) -> Self {
        Domain { name, chain_id: &env.block.chain_id, verifying_contract: env.contract.address.as_str() }
    }

    pub fn separator(&self) -> [u8; 32] {
        let mut enc = Vec::with_capacity(32 * 5);
        enc.extend_from_slice(&keccak(DOMAIN_TYPE));
        enc.extend_from_slice(&keccak(self.name.as_bytes()));
        enc.extend_from_slice(&keccak(DOMAIN_VERSION.as_bytes()));
        enc.extend_from_slice(&keccak(self.chain_id.as_bytes()));
        enc.extend_from_slice(&keccak(self.verifying_contract.as_bytes()));
        keccak(&enc)
    }
}

/// 购买条款；referral_wallet 为空字符串表示没有推荐人
#[derive(Clone, Debug, PartialEq)]
pub struct BuyParams<'a> {
    pub to: &'a str,
    pub amount_usdt: Uint128,
    pub discount_percent: u32,
    pub referral_wallet: &'a str,
    pub referral_reward_percent: u32,
    pub sender: &'a str,
}

impl BuyParams<'_> {
    fn struct_hash(&self) -> [u8; 32] {
        let mut enc = Vec::with_capacity(32 * 7);
        enc.extend_from_slice(&keccak(BUY_TYPE));
        enc.extend_from_slice(&keccak(self.to.as_bytes()));
        enc.extend_from_slice(&word(self.amount_usdt.u128()));
        enc.extend_from_slice(&word(self.discount_percent.into()));
        enc.extend_from_slice(&keccak(self.referral_wallet.as_bytes()));
        enc.extend_from_slice(&word(self.referral_reward_percent.into()));
        enc.extend_from_slice(&keccak(self.sender.as_bytes()));
        keccak(&enc)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClaimParams<'a> {
    pub to: &'a str,
    pub token_id: u64,
    pub amount: Uint128,
    pub nonce: u64,
    pub sender: &'a str,
}

impl ClaimParams<'_> {
    fn struct_hash(&self) -> [u8; 32] {
        let mut enc = Vec::with_capacity(32 * 6);
        enc.extend_from_slice(&keccak(CLAIM_TYPE));
        enc.extend_from_slice(&keccak(self.to.as_bytes()));
        enc.extend_from_slice(&word(self.token_id.into()));
        enc.extend_from_slice(&word(self.amount.u128()));
        enc.extend_from_slice(&word(self.nonce.into()));
        enc.extend_from_slice(&keccak(self.sender.as_bytes()));
        keccak(&enc)
    }
}

pub fn buy_digest(domain: &Domain, params: &BuyParams) -> [u8; 32] {
    typed_digest(&domain.separator(), &params.struct_hash())
}

pub fn claim_digest(domain: &Domain, params: &ClaimParams) -> [u8; 32] {
    typed_digest(&domain.separator(), &params.struct_hash())
}

fn typed_digest(separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 32] {
    let mut enc = Vec::with_capacity(2 + 64);
    enc.extend_from_slice(&[0x19, 0x01]);
    enc.extend_from_slice(separator);
    enc.extend_from_slice(struct_hash);
    keccak(&enc)
}

fn keccak(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

fn word(value: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[16..].copy_from_slice(&value.to_be_bytes());
    out
}

/// 未压缩公钥（65 字节，0x04 前缀）→ 20 字节地址
pub fn address_from_pubkey(pubkey: &[u8]) -> Result<[u8; 20], ContractError> {
    if pubkey.len() != 65 || pubkey[0] != 0x04 {
        return Err(ContractError::InvalidSignature);
    }
    let hash = keccak(&pubkey[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    Ok(addr)
}

/// 从签名中恢复签名者地址
pub fn recover_signer(api: &dyn Api, digest: &[u8; 32], signature: &[u8]) -> Result<[u8; 20], ContractError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(ContractError::InvalidSignatureLength { length: signature.len() });
    }
    let recovery_param = match signature[64] {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(ContractError::InvalidSignature),
    };
    if signature[32..64] > HALF_ORDER[..] {
        return Err(ContractError::InvalidSignature);
    }
    let pubkey = api
        .secp256k1_recover_pubkey(digest, &signature[..64], recovery_param)
        .map_err(|_| ContractError::InvalidSignature)?;
    address_from_pubkey(&pubkey)
}

fn ensure_trusted(api: &dyn Api, cfg: &Config, digest: &[u8; 32], signature: &[u8]) -> Result<(), ContractError> {
    let signer = recover_signer(api, digest, signature)?;
    if signer[..] != *cfg.api_signer.as_slice() {
        api.debug(&format!("authorization signed by untrusted key {}", format_signer(&signer)));
        return Err(ContractError::InvalidSignature);
    }
    Ok(())
}

/// 校验购买授权（不消费签名）
pub fn verify_buy(deps: Deps, env: &Env, cfg: &Config, params: &BuyParams, signature: &[u8]) -> Result<(), ContractError> {
    let digest = buy_digest(&Domain::for_contract(SALE_DOMAIN_NAME, env), params);
    ensure_trusted(deps.api, cfg, &digest, signature)
}

/// 校验领奖授权并在同一步中记录为已使用
pub fn verify_and_consume_claim(
    deps: DepsMut,
    env: &Env,
    cfg: &Config,
    params: &ClaimParams,
    signature: &[u8],
) -> Result<(), ContractError> {
    let digest = claim_digest(&Domain::for_contract(SPINNER_DOMAIN_NAME, env), params);
    ensure_trusted(deps.api, cfg, &digest, signature)?;
    let key = signature_key(signature);
    if USED_SIGNATURES.has(deps.storage, key.as_slice()) {
        deps.api.debug("claim authorization replayed");
        return Err(ContractError::InvalidSignature);
    }
    USED_SIGNATURES.save(deps.storage, key.as_slice(), &true)?;
    Ok(())
}

/// 消费集合的键：sha256(signature)
pub fn signature_key(signature: &[u8]) -> Vec<u8> {
    Sha256::digest(signature).to_vec()
}

/// 解析十六进制签名者地址（可带 0x 前缀），拒绝零地址
pub fn parse_signer(signer: &str) -> Result<HexBinary, ContractError> {
    let raw = signer.trim().trim_start_matches("0x").trim_start_matches("0X");
    if raw.is_empty() {
        return Err(ContractError::ZeroAddressProvided);
    }
    let bytes = hex::decode(raw).map_err(|e| StdError::generic_err(format!("invalid api signer: {e}")))?;
    if bytes.len() != 20 {
        return Err(StdError::generic_err(format!("invalid api signer length: {}", bytes.len())).into());
    }
    if bytes.iter().all(|b| *b == 0) {
        return Err(ContractError::ZeroAddressProvided);
    }
    Ok(HexBinary::from(bytes))
}

pub fn format_signer(signer: &[u8]) -> String {
    format!("0x{}", hex::encode(signer))
}
