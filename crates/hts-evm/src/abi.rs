//! ABI surface of the token service system contract.
//!
//! Two dialects are served from the same dispatch table. The native dialect exposes
//! `IHederaTokenService`-shaped functions addressed directly at the system contract. The ERC
//! dialect is reached through the `redirectForToken` proxy, whose payload embeds the target token
//! address followed by an ERC-20/721 style nested call. Logically equivalent functions from the
//! two dialects decode into the same operation descriptors downstream.
//!
//! Selectors are derived from the `sol!`-generated call types; there is no hand-maintained
//! selector table to drift out of sync with the signatures.

use alloy_primitives::Address;
use alloy_sol_types::sol;

sol! {
    /// Expiry metadata of a token (version 1 ABI).
    #[derive(Debug, Default, PartialEq, Eq)]
    struct Expiry {
        int64 second;
        address autoRenewAccount;
        int64 autoRenewPeriod;
    }

    /// One of the mutually exclusive representations of a key.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct KeyValue {
        bool inheritAccountKey;
        address contractId;
        bytes ed25519;
        bytes ECDSA_secp256k1;
        address delegatableContractId;
    }

    /// A key and the bit set of roles it serves.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct TokenKey {
        uint256 keyType;
        KeyValue key;
    }

    /// Token definition used by create and version-1 update calls.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct HederaToken {
        string name;
        string symbol;
        address treasury;
        string memo;
        bool tokenSupplyType;
        uint32 maxSupply;
        bool freezeDefault;
        TokenKey[] tokenKeys;
        Expiry expiry;
    }

    /// Token definition used by version-2 update calls (64-bit max supply).
    #[derive(Debug, Default, PartialEq, Eq)]
    struct HederaTokenV2 {
        string name;
        string symbol;
        address treasury;
        string memo;
        bool tokenSupplyType;
        int64 maxSupply;
        bool freezeDefault;
        TokenKey[] tokenKeys;
        Expiry expiry;
    }

    /// A flat custom fee.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct FixedFee {
        int64 amount;
        address tokenId;
        bool useHbarsForPayment;
        bool useCurrentTokenForPayment;
        address feeCollector;
    }

    /// A fractional custom fee on fungible transfers.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct FractionalFee {
        int64 numerator;
        int64 denominator;
        int64 minimumAmount;
        int64 maximumAmount;
        bool netOfTransfers;
        address feeCollector;
    }

    /// A royalty custom fee on NFT exchanges.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct RoyaltyFee {
        int64 numerator;
        int64 denominator;
        int64 amount;
        address tokenId;
        bool useHbarsForPayment;
        address feeCollector;
    }

    /// A signed balance adjustment (version 1, no approval flag).
    #[derive(Debug, Default, PartialEq, Eq)]
    struct AccountAmountV1 {
        address accountID;
        int64 amount;
    }

    /// An NFT ownership change (version 1, no approval flag).
    #[derive(Debug, Default, PartialEq, Eq)]
    struct NftTransferV1 {
        address senderAccountID;
        address receiverAccountID;
        int64 serialNumber;
    }

    /// Per-token transfer list (version 1).
    #[derive(Debug, Default, PartialEq, Eq)]
    struct TokenTransferListV1 {
        address token;
        AccountAmountV1[] transfers;
        NftTransferV1[] nftTransfers;
    }

    /// A signed balance adjustment.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct AccountAmount {
        address accountID;
        int64 amount;
        bool isApproval;
    }

    /// An NFT ownership change.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct NftTransfer {
        address senderAccountID;
        address receiverAccountID;
        int64 serialNumber;
        bool isApproval;
    }

    /// The hbar leg of a version-2 `cryptoTransfer`.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct TransferList {
        AccountAmount[] transfers;
    }

    /// Per-token transfer list.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct TokenTransferList {
        address token;
        AccountAmount[] transfers;
        NftTransfer[] nftTransfers;
    }

    /// Aggregate token view returned by `getTokenInfo`.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct TokenInfo {
        HederaToken token;
        int64 totalSupply;
        bool deleted;
        bool defaultKycStatus;
        bool pauseStatus;
        FixedFee[] fixedFees;
        FractionalFee[] fractionalFees;
        RoyaltyFee[] royaltyFees;
        string ledgerId;
    }

    /// Aggregate fungible token view.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct FungibleTokenInfo {
        TokenInfo tokenInfo;
        int32 decimals;
    }

    /// Aggregate non-fungible serial view.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct NonFungibleTokenInfo {
        TokenInfo tokenInfo;
        int64 serialNumber;
        address ownerId;
        int64 creationTime;
        bytes metadata;
        address spenderId;
    }

    /// Native-dialect functions of the token service system contract.
    interface IHederaTokenService {
        function cryptoTransfer(TokenTransferListV1[] memory tokenTransfers)
            external
            returns (int64 responseCode);
        function transferTokens(address token, address[] memory accountId, int64[] memory amount)
            external
            returns (int64 responseCode);
        function transferToken(address token, address sender, address receiver, int64 amount)
            external
            returns (int64 responseCode);
        function transferNFTs(
            address token,
            address[] memory sender,
            address[] memory receiver,
            int64[] memory serialNumber
        ) external returns (int64 responseCode);
        function transferNFT(address token, address sender, address receiver, int64 serialNumber)
            external
            returns (int64 responseCode);

        function mintToken(address token, uint64 amount, bytes[] memory metadata)
            external
            returns (int64 responseCode, int64 newTotalSupply, int64[] memory serialNumbers);
        function burnToken(address token, uint64 amount, int64[] memory serialNumbers)
            external
            returns (int64 responseCode, int64 newTotalSupply);
        function wipeTokenAccount(address token, address account, uint32 amount)
            external
            returns (int64 responseCode);
        function wipeTokenAccountNFT(address token, address account, int64[] memory serialNumbers)
            external
            returns (int64 responseCode);

        function associateTokens(address account, address[] memory tokens)
            external
            returns (int64 responseCode);
        function associateToken(address account, address token)
            external
            returns (int64 responseCode);
        function dissociateTokens(address account, address[] memory tokens)
            external
            returns (int64 responseCode);
        function dissociateToken(address account, address token)
            external
            returns (int64 responseCode);

        function freezeToken(address token, address account) external returns (int64 responseCode);
        function unfreezeToken(address token, address account)
            external
            returns (int64 responseCode);
        function grantTokenKyc(address token, address account)
            external
            returns (int64 responseCode);
        function revokeTokenKyc(address token, address account)
            external
            returns (int64 responseCode);
        function pauseToken(address token) external returns (int64 responseCode);
        function unpauseToken(address token) external returns (int64 responseCode);
        function deleteToken(address token) external returns (int64 responseCode);

        function updateTokenInfo(address token, HederaToken memory tokenInfo)
            external
            returns (int64 responseCode);
        function updateTokenKeys(address token, TokenKey[] memory keys)
            external
            returns (int64 responseCode);
        function updateTokenExpiryInfo(address token, Expiry memory expiryInfo)
            external
            returns (int64 responseCode);

        function createFungibleToken(
            HederaToken memory token,
            uint256 initialTotalSupply,
            uint256 decimals
        ) external payable returns (int64 responseCode, address tokenAddress);
        function createFungibleTokenWithCustomFees(
            HederaToken memory token,
            uint256 initialTotalSupply,
            uint256 decimals,
            FixedFee[] memory fixedFees,
            FractionalFee[] memory fractionalFees
        ) external payable returns (int64 responseCode, address tokenAddress);
        function createNonFungibleToken(HederaToken memory token)
            external
            payable
            returns (int64 responseCode, address tokenAddress);
        function createNonFungibleTokenWithCustomFees(
            HederaToken memory token,
            FixedFee[] memory fixedFees,
            RoyaltyFee[] memory royaltyFees
        ) external payable returns (int64 responseCode, address tokenAddress);

        function getTokenInfo(address token)
            external
            returns (int64 responseCode, TokenInfo memory tokenInfo);
        function getFungibleTokenInfo(address token)
            external
            returns (int64 responseCode, FungibleTokenInfo memory tokenInfo);
        function getNonFungibleTokenInfo(address token, int64 serialNumber)
            external
            returns (int64 responseCode, NonFungibleTokenInfo memory tokenInfo);
        function getTokenCustomFees(address token)
            external
            returns (
                int64 responseCode,
                FixedFee[] memory fixedFees,
                FractionalFee[] memory fractionalFees,
                RoyaltyFee[] memory royaltyFees
            );
        function getTokenDefaultFreezeStatus(address token)
            external
            returns (int64 responseCode, bool defaultFreezeStatus);
        function getTokenDefaultKycStatus(address token)
            external
            returns (int64 responseCode, bool defaultKycStatus);
        function getTokenKey(address token, uint256 keyType)
            external
            returns (int64 responseCode, KeyValue memory key);
        function getTokenType(address token)
            external
            returns (int64 responseCode, int32 tokenType);
        function getTokenExpiryInfo(address token)
            external
            returns (int64 responseCode, Expiry memory expiryInfo);
        function isKyc(address token, address account)
            external
            returns (int64 responseCode, bool kycGranted);
        function isFrozen(address token, address account)
            external
            returns (int64 responseCode, bool frozen);
        function isToken(address token) external returns (int64 responseCode, bool isToken);

        function allowance(address token, address owner, address spender)
            external
            returns (int64 responseCode, uint256 allowance);
        function approve(address token, address spender, uint256 amount)
            external
            returns (int64 responseCode, bool success);
        function approveNFT(address token, address approved, uint256 serialNumber)
            external
            returns (int64 responseCode);
        function getApproved(address token, uint256 serialNumber)
            external
            returns (int64 responseCode, address approved);
        function setApprovalForAll(address token, address operator, bool approved)
            external
            returns (int64 responseCode);
        function isApprovedForAll(address token, address owner, address operator)
            external
            returns (int64 responseCode, bool approved);
        function transferFrom(address token, address from, address to, uint256 amount)
            external
            returns (int64 responseCode);
        function transferFromNFT(address token, address from, address to, uint256 serialNumber)
            external
            returns (int64 responseCode);

        function redirectForToken(address token, bytes memory encodedFunctionSelector)
            external
            returns (int64 responseCode, bytes memory response);
    }

    /// Version-2 overloads, dispatched by their own selectors.
    interface IHederaTokenServiceV2 {
        function cryptoTransfer(
            TransferList memory transferList,
            TokenTransferList[] memory tokenTransfers
        ) external returns (int64 responseCode);
        function updateTokenInfo(address token, HederaTokenV2 memory tokenInfo)
            external
            returns (int64 responseCode);
    }

    /// ERC-20/721 style functions served through the `redirectForToken` proxy.
    interface IErcToken {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function ownerOf(uint256 tokenId) external view returns (address);
        function tokenURI(uint256 tokenId) external view returns (string memory);
        function transfer(address recipient, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
        function getApproved(uint256 tokenId) external view returns (address);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
    }
}

/// Byte length of a function selector.
pub const SELECTOR_LEN: usize = 4;

/// Byte offset of the nested call inside a packed `redirectForToken` payload.
const REDIRECT_DESCRIPTOR_OFFSET: usize = SELECTOR_LEN + Address::len_bytes();

/// Extracts the 4-byte selector, or `None` for inputs with no fragment-complete selector.
pub fn selector_of(input: &[u8]) -> Option<[u8; 4]> {
    let raw = input.get(..SELECTOR_LEN)?;
    let mut selector = [0u8; 4];
    selector.copy_from_slice(raw);
    Some(selector)
}

/// The target of a `redirectForToken` proxy call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectTarget {
    /// The token the nested call is scoped to.
    pub token: Address,
    /// The nested call's selector.
    pub descriptor: [u8; 4],
}

/// Parses the packed `redirectForToken` form: selector, then the 20-byte token address, then the
/// nested calldata.
///
/// Returns the target plus the nested calldata slice, or `None` when the payload is too short to
/// hold both.
pub fn redirect_target(input: &[u8]) -> Option<(RedirectTarget, &[u8])> {
    let token_bytes = input.get(SELECTOR_LEN..REDIRECT_DESCRIPTOR_OFFSET)?;
    let nested = input.get(REDIRECT_DESCRIPTOR_OFFSET..)?;
    let descriptor = selector_of(nested)?;
    Some((RedirectTarget { token: Address::from_slice(token_bytes), descriptor }, nested))
}

/// Whether the input is a `redirectForToken` proxy call.
pub fn is_token_proxy_redirect(input: &[u8]) -> bool {
    selector_of(input)
        .is_some_and(|s| s == <IHederaTokenService::redirectForTokenCall as alloy_sol_types::SolCall>::SELECTOR)
}

/// Whether the input selects one of the read-only native functions.
pub fn is_view_function(input: &[u8]) -> bool {
    use alloy_sol_types::SolCall;
    use self::IHederaTokenService as Hts;
    let Some(selector) = selector_of(input) else { return false };
    matches!(
        selector,
        s if s == Hts::getTokenInfoCall::SELECTOR
            || s == Hts::getFungibleTokenInfoCall::SELECTOR
            || s == Hts::getNonFungibleTokenInfoCall::SELECTOR
            || s == Hts::getTokenCustomFeesCall::SELECTOR
            || s == Hts::getTokenDefaultFreezeStatusCall::SELECTOR
            || s == Hts::getTokenDefaultKycStatusCall::SELECTOR
            || s == Hts::getTokenKeyCall::SELECTOR
            || s == Hts::getTokenTypeCall::SELECTOR
            || s == Hts::getTokenExpiryInfoCall::SELECTOR
            || s == Hts::isKycCall::SELECTOR
            || s == Hts::isFrozenCall::SELECTOR
            || s == Hts::isTokenCall::SELECTOR
            || s == Hts::allowanceCall::SELECTOR
            || s == Hts::getApprovedCall::SELECTOR
            || s == Hts::isApprovedForAllCall::SELECTOR
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_sol_types::SolCall;

    #[test]
    fn short_input_has_no_selector() {
        assert_eq!(selector_of(&[]), None);
        assert_eq!(selector_of(&[0xab, 0xcd, 0xef]), None);
        assert_eq!(selector_of(&[0xab, 0xcd, 0xef, 0x01]), Some([0xab, 0xcd, 0xef, 0x01]));
    }

    #[test]
    fn erc_selectors_match_known_values() {
        // These are the canonical ERC-20/721 selectors; they anchor the sol! signatures.
        assert_eq!(hex::encode(IErcToken::transferCall::SELECTOR), "a9059cbb");
        assert_eq!(IErcToken::transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(IErcToken::transferFromCall::SELECTOR, [0x23, 0xb8, 0x72, 0xdd]);
        assert_eq!(IErcToken::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(IErcToken::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IErcToken::ownerOfCall::SELECTOR, [0x63, 0x52, 0x21, 0x1e]);
        assert_eq!(IErcToken::nameCall::SELECTOR, [0x06, 0xfd, 0xde, 0x03]);
        assert_eq!(IErcToken::symbolCall::SELECTOR, [0x95, 0xd8, 0x9b, 0x41]);
        assert_eq!(IErcToken::decimalsCall::SELECTOR, [0x31, 0x3c, 0xe5, 0x67]);
        assert_eq!(IErcToken::totalSupplyCall::SELECTOR, [0x18, 0x16, 0x0d, 0xdd]);
        assert_eq!(IErcToken::tokenURICall::SELECTOR, [0xc8, 0x7b, 0x56, 0xdd]);
    }

    #[test]
    fn redirect_payload_parses_packed_form() {
        let token = address!("0000000000000000000000000000000000001234");
        let nested = IErcToken::nameCall {}.abi_encode();
        let mut input = IHederaTokenService::redirectForTokenCall::SELECTOR.to_vec();
        input.extend_from_slice(token.as_slice());
        input.extend_from_slice(&nested);

        assert!(is_token_proxy_redirect(&input));
        let (target, nested_slice) = redirect_target(&input).expect("parses");
        assert_eq!(target.token, token);
        assert_eq!(target.descriptor, IErcToken::nameCall::SELECTOR);
        assert_eq!(nested_slice, nested.as_slice());
    }

    #[test]
    fn truncated_redirect_is_rejected() {
        let mut input = IHederaTokenService::redirectForTokenCall::SELECTOR.to_vec();
        input.extend_from_slice(&[0u8; 10]);
        assert!(redirect_target(&input).is_none());
    }

    #[test]
    fn view_classification() {
        let view = IHederaTokenService::getTokenInfoCall { token: Address::ZERO }.abi_encode();
        assert!(is_view_function(&view));
        let mutating = IHederaTokenService::pauseTokenCall { token: Address::ZERO }.abi_encode();
        assert!(!is_view_function(&mutating));
    }
}
