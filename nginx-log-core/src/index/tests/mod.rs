mod sharded_tests;
