//! ABI of the DNA identity ledger contract.

use alloy_sol_types::sol;

sol! {
    /// ERC-721 DNA identity registry.
    interface IDnaIdentity {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function balanceOf(address owner) external view returns (uint256 balance);
        function ownerOf(uint256 tokenId) external view returns (address owner);
        function tokenCounter() external view returns (uint256 counter);
        function tokenURI(uint256 tokenId) external view returns (string uri);
        function getDNAHash(uint256 tokenId) external view returns (string dnaHash);
        function verifyDNA(uint256 tokenId, string dnaHash) external view returns (bool valid);
        function mintDNAIdentity(string dnaHash, string metadata) external returns (uint256 tokenId);
    }
}
