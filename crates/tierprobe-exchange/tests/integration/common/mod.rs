pub mod mock_bingx;
