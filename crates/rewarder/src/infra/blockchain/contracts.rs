//! Bindings for the quiz contract. Only the entry points the service calls
//! are declared.

use {
    crate::domain::{eth, operation::Operation},
    alloy::sol_types::SolCall,
};

alloy::sol! {
    #[sol(rpc)]
    interface BasedQuiz {
        function owner() external view returns (address);
        function getStreak(address player) external view returns (uint256);
        function distributeReward(uint256 quizId, address[] calldata players) external;
        function awardSocialShareBonus(address player) external;
    }
}

/// ABI encoded call for the operation.
pub fn calldata(operation: &Operation) -> Vec<u8> {
    match operation {
        Operation::SocialShareBonus { player } => {
            BasedQuiz::awardSocialShareBonusCall { player: *player }.abi_encode()
        }
        Operation::DistributeReward {
            quiz_id, player, ..
        } => BasedQuiz::distributeRewardCall {
            quizId: eth::U256::from(quiz_id.0),
            players: vec![*player],
        }
        .abi_encode(),
    }
}
