//! ABI bindings for the crowdfunding contract and its ERC-20 token.

use alloy::sol;

sol! {
    /// The crowdfunding contract surface.
    #[derive(Debug, PartialEq, Eq)]
    interface ICrowdFund {
        event Launch(uint256 id, address indexed creator, uint256 goal, uint32 startAt, uint32 endAt);
        event Cancel(uint256 id);
        event Pledge(uint256 indexed id, address indexed caller, uint256 amount);
        event Unpledge(uint256 indexed id, address indexed caller, uint256 amount);
        event Claim(uint256 id);
        event Refund(uint256 id, address indexed caller, uint256 amount);

        function launch(uint256 goal, uint32 startAt, uint32 endAt) external;
        function cancel(uint256 id) external;
        function pledge(uint256 id, uint256 amount) external;
        function unpledge(uint256 id, uint256 amount) external;
        function claim(uint256 id) external;
        function refund(uint256 id) external;
        function count() external view returns (uint256);
        function campaigns(uint256 id) external view returns (address creator, uint256 goal, uint256 pledged, uint32 startAt, uint32 endAt, bool claimed);
        function pledgedAmount(uint256 id, address account) external view returns (uint256);
    }

    /// The subset of ERC-20 the client uses.
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}
